//! Configuration error types.
//!
//! The running simulation never surfaces errors: a malformed overlap or a
//! declined spawn is skipped and the tick carries on.  Errors only exist at
//! the edge where tuning data enters the system (`assets/combat.toml`), so
//! [`CombatConfig::validate`](crate::config::CombatConfig::validate) can
//! reject a table before it reaches the field manager.

use std::fmt;

/// Top-level error enum for driftfield configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// `assets/combat.toml` could not be parsed.
    Parse {
        /// Parser message, including the offending line where available.
        message: String,
    },

    /// The asteroid type table has no entries to draw from.
    EmptyAsteroidTable,

    /// A weight table cannot be sampled: a negative or non-finite entry, or
    /// every entry zero.
    InvalidWeights {
        /// Which table was rejected (for logging).
        table: &'static str,
    },

    /// The spawn rectangle has a non-positive width or height.
    InvalidSpawnArea { width: f32, height: f32 },

    /// A tuning constant is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Parse { message } => write!(f, "config parse error: {}", message),
            SimError::EmptyAsteroidTable => {
                write!(f, "asteroid type table is empty; nothing can spawn")
            }
            SimError::InvalidWeights { table } => write!(
                f,
                "weight table '{}' needs finite, non-negative entries with a positive sum",
                table
            ),
            SimError::InvalidSpawnArea { width, height } => write!(
                f,
                "spawn area must have positive extent, got {} x {}",
                width, height
            ),
            SimError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `weights` can drive a weighted draw.
pub fn validate_weights(table: &'static str, weights: &[f32]) -> SimResult<()> {
    let well_formed = weights.iter().all(|w| w.is_finite() && *w >= 0.0);
    let sum: f32 = weights.iter().sum();
    if well_formed && sum > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidWeights { table })
    }
}

/// Returns an error if `value` is not strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error if `value` is negative.  Zero is allowed (e.g. a weapon
/// with no cooldown).
pub fn validate_non_negative(name: &'static str, value: f32) -> SimResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, ∞)",
        })
    }
}
