//! Runtime combat configuration loaded from `assets/combat.toml`.
//!
//! [`CombatConfig`] is a Bevy [`Resource`] that mirrors every constant in
//! [`crate::constants`].  At startup, [`load_combat_config`] reads
//! `assets/combat.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about.
//!
//! ## Usage in systems
//!
//! Add `config: Res<CombatConfig>` to any system parameter list and read values
//! with `config.min_spacing`, `config.blaster.cooldown_secs`, etc.
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/combat.toml`.
//! 2. Restart the simulation; no recompilation required.
//! 3. Run `cargo test` to validate the new values.
//!
//! The impact-damage factor and rarity weights are prototype tuning numbers,
//! not design invariants; they live here so they can move freely.

use crate::asteroid::SizeTier;
use crate::catalog::ResourceKind;
use crate::constants::*;
use crate::error::{
    validate_non_negative, validate_positive, validate_weights, SimError, SimResult,
};
use crate::simulation::SimRng;
use bevy::prelude::*;
use serde::Deserialize;

/// Path read by [`load_combat_config`], relative to the working directory.
pub const CONFIG_PATH: &str = "assets/combat.toml";

/// Axis-aligned rectangle new asteroids are placed in.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpawnArea {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for SpawnArea {
    fn default() -> Self {
        Self {
            min_x: SPAWN_AREA_MIN_X,
            min_y: SPAWN_AREA_MIN_Y,
            width: SPAWN_AREA_WIDTH,
            height: SPAWN_AREA_HEIGHT,
        }
    }
}

/// One row of the weighted asteroid type table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AsteroidType {
    pub name: String,
    pub health: f32,
    pub scale: f32,
    pub resource: ResourceKind,
    pub resource_amount: u32,
    /// Relative draw weight; need not sum to 1 across the table.
    pub weight: f32,
}

impl Default for AsteroidType {
    fn default() -> Self {
        Self {
            name: "rock".to_string(),
            health: ASTEROID_DEFAULT_HEALTH,
            scale: 1.0,
            resource: ResourceKind::Minerals,
            resource_amount: ASTEROID_DEFAULT_RESOURCE_AMOUNT,
            weight: 1.0,
        }
    }
}

/// Bounce and drag handed to the physics host for one size tier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierPhysics {
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for TierPhysics {
    fn default() -> Self {
        Self {
            restitution: MEDIUM_RESTITUTION,
            linear_damping: MEDIUM_LINEAR_DAMPING,
            angular_damping: MEDIUM_ANGULAR_DAMPING,
        }
    }
}

/// Per-tier physics parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierPhysicsTable {
    pub small: TierPhysics,
    pub medium: TierPhysics,
    pub large: TierPhysics,
}

impl Default for TierPhysicsTable {
    fn default() -> Self {
        Self {
            small: TierPhysics {
                restitution: SMALL_RESTITUTION,
                linear_damping: SMALL_LINEAR_DAMPING,
                angular_damping: SMALL_ANGULAR_DAMPING,
            },
            medium: TierPhysics::default(),
            large: TierPhysics {
                restitution: LARGE_RESTITUTION,
                linear_damping: LARGE_LINEAR_DAMPING,
                angular_damping: LARGE_ANGULAR_DAMPING,
            },
        }
    }
}

impl TierPhysicsTable {
    #[inline]
    pub fn get(&self, tier: SizeTier) -> TierPhysics {
        match tier {
            SizeTier::Small => self.small,
            SizeTier::Medium => self.medium,
            SizeTier::Large => self.large,
        }
    }
}

/// `[common, uncommon, rare]` loot weights per source size tier.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RarityWeights {
    pub small: [f32; 3],
    pub medium: [f32; 3],
    pub large: [f32; 3],
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            small: SMALL_RARITY_WEIGHTS,
            medium: MEDIUM_RARITY_WEIGHTS,
            large: LARGE_RARITY_WEIGHTS,
        }
    }
}

impl RarityWeights {
    #[inline]
    pub fn get(&self, tier: SizeTier) -> [f32; 3] {
        match tier {
            SizeTier::Small => self.small,
            SizeTier::Medium => self.medium,
            SizeTier::Large => self.large,
        }
    }
}

/// Instant-projectile weapon (primary blaster).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlasterConfig {
    pub damage: f32,
    pub cooldown_secs: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
}

impl Default for BlasterConfig {
    fn default() -> Self {
        Self {
            damage: BLASTER_DAMAGE,
            cooldown_secs: BLASTER_COOLDOWN_SECS,
            projectile_speed: BLASTER_PROJECTILE_SPEED,
            projectile_lifetime: BLASTER_PROJECTILE_LIFETIME,
        }
    }
}

/// Delayed-explosive weapon (rocket launcher).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RocketConfig {
    pub damage: f32,
    pub cooldown_secs: f32,
    pub projectile_speed: f32,
    pub projectile_lifetime: f32,
    pub blast_radius: f32,
}

impl Default for RocketConfig {
    fn default() -> Self {
        Self {
            damage: ROCKET_DAMAGE,
            cooldown_secs: ROCKET_COOLDOWN_SECS,
            projectile_speed: ROCKET_PROJECTILE_SPEED,
            projectile_lifetime: ROCKET_PROJECTILE_LIFETIME,
            blast_radius: ROCKET_BLAST_RADIUS,
        }
    }
}

/// Self-buff weapon (cloaking device).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CloakConfig {
    pub cooldown_secs: f32,
    pub duration_secs: f32,
    pub alpha: f32,
}

impl Default for CloakConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: CLOAK_COOLDOWN_SECS,
            duration_secs: CLOAK_DURATION_SECS,
            alpha: CLOAK_ALPHA,
        }
    }
}

/// Runtime-tunable combat, loot and field configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/combat.toml`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,

    // ── Asteroid Field ───────────────────────────────────────────────────────
    pub max_asteroids: usize,
    pub min_spacing: f32,
    pub respawn_delay_secs: f32,
    pub spawn_area: SpawnArea,
    pub asteroid_types: Vec<AsteroidType>,

    // ── Asteroid ─────────────────────────────────────────────────────────────
    pub asteroid_base_radius: f32,
    pub asteroid_drift_range: f32,
    pub asteroid_spin_range: f32,
    pub tier_physics: TierPhysicsTable,

    // ── Loot ─────────────────────────────────────────────────────────────────
    pub loot_magnet_range: f32,
    pub loot_magnet_strength: f32,
    pub loot_lifetime_secs: f32,
    pub loot_scatter_speed_min: f32,
    pub loot_scatter_speed_max: f32,
    pub loot_momentum_transfer: f32,
    pub loot_spin_range: f32,
    pub loot_collider_radius: f32,
    pub rarity_weights: RarityWeights,

    // ── Weapons ──────────────────────────────────────────────────────────────
    pub default_projectile_damage: f32,
    pub muzzle_offset: f32,
    pub projectile_collider_radius: f32,
    pub blaster: BlasterConfig,
    pub rocket: RocketConfig,
    pub cloak: CloakConfig,

    // ── Collector ────────────────────────────────────────────────────────────
    pub collector_max_health: f32,
    pub collector_max_shield: f32,
    pub collector_collider_radius: f32,
    pub collector_linear_damping: f32,
    pub impact_damage_factor: f32,
    pub impact_knockback: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: None,
            // Asteroid Field
            max_asteroids: FIELD_MAX_ASTEROIDS,
            min_spacing: FIELD_MIN_SPACING,
            respawn_delay_secs: FIELD_RESPAWN_DELAY_SECS,
            spawn_area: SpawnArea::default(),
            asteroid_types: default_asteroid_types(),
            // Asteroid
            asteroid_base_radius: ASTEROID_BASE_RADIUS,
            asteroid_drift_range: ASTEROID_DRIFT_RANGE,
            asteroid_spin_range: ASTEROID_SPIN_RANGE,
            tier_physics: TierPhysicsTable::default(),
            // Loot
            loot_magnet_range: LOOT_MAGNET_RANGE,
            loot_magnet_strength: LOOT_MAGNET_STRENGTH,
            loot_lifetime_secs: LOOT_LIFETIME_SECS,
            loot_scatter_speed_min: LOOT_SCATTER_SPEED_MIN,
            loot_scatter_speed_max: LOOT_SCATTER_SPEED_MAX,
            loot_momentum_transfer: LOOT_MOMENTUM_TRANSFER,
            loot_spin_range: LOOT_SPIN_RANGE,
            loot_collider_radius: LOOT_COLLIDER_RADIUS,
            rarity_weights: RarityWeights::default(),
            // Weapons
            default_projectile_damage: DEFAULT_PROJECTILE_DAMAGE,
            muzzle_offset: MUZZLE_OFFSET,
            projectile_collider_radius: PROJECTILE_COLLIDER_RADIUS,
            blaster: BlasterConfig::default(),
            rocket: RocketConfig::default(),
            cloak: CloakConfig::default(),
            // Collector
            collector_max_health: COLLECTOR_MAX_HEALTH,
            collector_max_shield: COLLECTOR_MAX_SHIELD,
            collector_collider_radius: COLLECTOR_COLLIDER_RADIUS,
            collector_linear_damping: COLLECTOR_LINEAR_DAMPING,
            impact_damage_factor: IMPACT_DAMAGE_FACTOR,
            impact_knockback: IMPACT_KNOCKBACK,
        }
    }
}

/// One type per size tier, weighted toward small rocks.
fn default_asteroid_types() -> Vec<AsteroidType> {
    vec![
        AsteroidType {
            name: "pebble".to_string(),
            health: 30.0,
            scale: 0.4,
            resource: ResourceKind::Minerals,
            resource_amount: 5,
            weight: 0.5,
        },
        AsteroidType {
            name: "boulder".to_string(),
            health: 60.0,
            scale: 0.65,
            resource: ResourceKind::Elements,
            resource_amount: 10,
            weight: 0.3,
        },
        AsteroidType {
            name: "monolith".to_string(),
            health: ASTEROID_DEFAULT_HEALTH,
            scale: 1.0,
            resource: ResourceKind::Crystals,
            resource_amount: 20,
            weight: 0.2,
        },
    ]
}

impl CombatConfig {
    /// Parse a TOML document on top of the compiled defaults and validate it.
    pub fn from_toml_str(contents: &str) -> SimResult<Self> {
        let config: CombatConfig = toml::from_str(contents).map_err(|e| SimError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject tables the field manager or loot spawner cannot draw from, and
    /// constants outside their working range.
    pub fn validate(&self) -> SimResult<()> {
        if self.asteroid_types.is_empty() {
            return Err(SimError::EmptyAsteroidTable);
        }
        let type_weights: Vec<f32> = self.asteroid_types.iter().map(|t| t.weight).collect();
        validate_weights("asteroid_types", &type_weights)?;
        for asteroid_type in &self.asteroid_types {
            validate_positive("asteroid_types.health", asteroid_type.health)?;
            validate_positive("asteroid_types.scale", asteroid_type.scale)?;
        }

        validate_weights("rarity_weights.small", &self.rarity_weights.small)?;
        validate_weights("rarity_weights.medium", &self.rarity_weights.medium)?;
        validate_weights("rarity_weights.large", &self.rarity_weights.large)?;

        let extent_ok = |v: f32| v > 0.0 && v.is_finite();
        if !extent_ok(self.spawn_area.width) || !extent_ok(self.spawn_area.height) {
            return Err(SimError::InvalidSpawnArea {
                width: self.spawn_area.width,
                height: self.spawn_area.height,
            });
        }

        validate_non_negative("min_spacing", self.min_spacing)?;
        validate_non_negative("respawn_delay_secs", self.respawn_delay_secs)?;
        validate_positive("loot_magnet_range", self.loot_magnet_range)?;
        validate_positive("loot_lifetime_secs", self.loot_lifetime_secs)?;
        validate_non_negative("loot_scatter_speed_min", self.loot_scatter_speed_min)?;
        validate_non_negative("loot_scatter_speed_max", self.loot_scatter_speed_max)?;
        if self.loot_scatter_speed_max < self.loot_scatter_speed_min {
            return Err(SimError::UnsafeConstant {
                name: "loot_scatter_speed_max",
                value: self.loot_scatter_speed_max,
                safe_range: "[loot_scatter_speed_min, ∞)",
            });
        }
        validate_non_negative("loot_spin_range", self.loot_spin_range)?;
        validate_non_negative("asteroid_drift_range", self.asteroid_drift_range)?;
        validate_non_negative("asteroid_spin_range", self.asteroid_spin_range)?;
        validate_positive("default_projectile_damage", self.default_projectile_damage)?;
        validate_non_negative("blaster.cooldown_secs", self.blaster.cooldown_secs)?;
        validate_non_negative("rocket.cooldown_secs", self.rocket.cooldown_secs)?;
        validate_non_negative("cloak.cooldown_secs", self.cloak.cooldown_secs)?;
        validate_positive("cloak.duration_secs", self.cloak.duration_secs)?;
        validate_positive("collector_max_health", self.collector_max_health)?;
        validate_non_negative("collector_max_shield", self.collector_max_shield)?;
        validate_non_negative("impact_damage_factor", self.impact_damage_factor)?;
        Ok(())
    }
}

/// Startup system: attempt to load `assets/combat.toml` and overwrite the
/// `CombatConfig` resource with any values present in the file.
///
/// Missing keys retain their compiled defaults.  Parse and validation errors
/// are logged but do not abort the simulation.  A missing file is not an
/// error (defaults are already in place from `insert_resource`).  A seed in
/// the file reseeds [`SimRng`] so the whole run becomes reproducible.
pub fn load_combat_config(mut commands: Commands, mut config: ResMut<CombatConfig>) {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => match CombatConfig::from_toml_str(&contents) {
            Ok(loaded) => {
                if let Some(seed) = loaded.seed {
                    commands.insert_resource(SimRng::seeded(seed));
                }
                *config = loaded;
                info!("Loaded combat config from {CONFIG_PATH}");
            }
            Err(e) => {
                error!("Failed to load {CONFIG_PATH}: {e}; using defaults");
            }
        },
        Err(_) => {
            info!("No {CONFIG_PATH} found; using compiled defaults");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(CombatConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = CombatConfig::from_toml_str(
            r#"
            seed = 7
            min_spacing = 120.0

            [blaster]
            cooldown_secs = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_spacing, 120.0);
        assert_eq!(config.blaster.cooldown_secs, 0.5);
        assert_eq!(config.blaster.damage, BLASTER_DAMAGE);
        assert_eq!(config.rocket, RocketConfig::default());
        assert_eq!(config.asteroid_types.len(), 3);
    }

    #[test]
    fn asteroid_table_rows_fill_missing_fields() {
        let config = CombatConfig::from_toml_str(
            r#"
            [[asteroid_types]]
            name = "ice"
            resource = "shield_parts"
            scale = 0.3
            "#,
        )
        .unwrap();
        assert_eq!(config.asteroid_types.len(), 1);
        let ice = &config.asteroid_types[0];
        assert_eq!(ice.resource, ResourceKind::ShieldParts);
        assert_eq!(ice.health, ASTEROID_DEFAULT_HEALTH);
        assert_eq!(ice.weight, 1.0);
    }

    #[test]
    fn empty_table_and_bad_weights_are_rejected() {
        let mut config = CombatConfig::default();
        config.asteroid_types.clear();
        assert_eq!(config.validate(), Err(SimError::EmptyAsteroidTable));

        let mut config = CombatConfig::default();
        config.rarity_weights.large = [0.0, 0.0, 0.0];
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidWeights { table: "rarity_weights.large" })
        ));
    }

    #[test]
    fn malformed_toml_reports_a_parse_error() {
        let err = CombatConfig::from_toml_str("max_asteroids = \"many\"").unwrap_err();
        assert!(matches!(err, SimError::Parse { .. }));
    }

    #[test]
    fn degenerate_spawn_area_is_rejected() {
        let mut config = CombatConfig::default();
        config.spawn_area.width = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidSpawnArea { .. })
        ));
    }

    #[test]
    fn ranges_fed_to_the_rng_must_be_non_negative() {
        let err = CombatConfig::from_toml_str("asteroid_drift_range = -5.0\nmax_asteroids = 4")
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::UnsafeConstant { name: "asteroid_drift_range", .. }
        ));

        let mut config = CombatConfig::default();
        config.loot_spin_range = -1.0;
        assert!(config.validate().is_err());

        let mut config = CombatConfig::default();
        config.loot_scatter_speed_max = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(SimError::UnsafeConstant { name: "loot_scatter_speed_max", .. })
        ));
    }
}
