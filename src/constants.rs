//! Centralised combat, loot and field constants.
//!
//! [`crate::config::CombatConfig::default`] is built from these values, and
//! `assets/combat.toml` can override any of them at startup.
//!
//! Times are in seconds, distances in world units, speeds in units/second.

// ── Asteroid Field ────────────────────────────────────────────────────────────

/// Target asteroid population.  The field seeds half of this at startup and
/// never tracks more than this many live asteroids.
pub const FIELD_MAX_ASTEROIDS: usize = 20;

/// Minimum distance between a new asteroid and the collector or any live
/// asteroid, checked once at spawn time.
pub const FIELD_MIN_SPACING: f32 = 200.0;

/// Delay between an asteroid's destruction and the replacement spawn attempt.
pub const FIELD_RESPAWN_DELAY_SECS: f32 = 2.0;

/// Lower-left corner of the spawn rectangle.
pub const SPAWN_AREA_MIN_X: f32 = -1600.0;
pub const SPAWN_AREA_MIN_Y: f32 = -1600.0;

/// Extent of the spawn rectangle.
pub const SPAWN_AREA_WIDTH: f32 = 3200.0;
pub const SPAWN_AREA_HEIGHT: f32 = 3200.0;

// ── Asteroid ──────────────────────────────────────────────────────────────────

/// Health of an asteroid type that does not specify one.
pub const ASTEROID_DEFAULT_HEALTH: f32 = 100.0;

/// Resource amount of an asteroid type that does not specify one.
pub const ASTEROID_DEFAULT_RESOURCE_AMOUNT: u32 = 10;

/// Collider radius of a scale-1.0 asteroid.
pub const ASTEROID_BASE_RADIUS: f32 = 32.0;

/// Scale below which an asteroid is in the small tier.
pub const SMALL_TIER_MAX_SCALE: f32 = 0.5;

/// Scale below which an asteroid is in the medium tier (and at or above
/// [`SMALL_TIER_MAX_SCALE`]).
pub const MEDIUM_TIER_MAX_SCALE: f32 = 0.8;

/// Initial linear drift is drawn from `±ASTEROID_DRIFT_RANGE` per axis.
pub const ASTEROID_DRIFT_RANGE: f32 = 20.0;

/// Initial spin is drawn from `±ASTEROID_SPIN_RANGE` rad/s (~20°/s).
pub const ASTEROID_SPIN_RANGE: f32 = 0.35;

// ── Asteroid: Tier Physics ────────────────────────────────────────────────────

/// Small rocks bounce hardest and shed speed slowest.
pub const SMALL_RESTITUTION: f32 = 0.6;
pub const SMALL_LINEAR_DAMPING: f32 = 0.05;
pub const SMALL_ANGULAR_DAMPING: f32 = 0.1;

pub const MEDIUM_RESTITUTION: f32 = 0.5;
pub const MEDIUM_LINEAR_DAMPING: f32 = 0.1;
pub const MEDIUM_ANGULAR_DAMPING: f32 = 0.2;

pub const LARGE_RESTITUTION: f32 = 0.35;
pub const LARGE_LINEAR_DAMPING: f32 = 0.2;
pub const LARGE_ANGULAR_DAMPING: f32 = 0.4;

// ── Loot ──────────────────────────────────────────────────────────────────────

/// Distance within which pickups are pulled toward the collector.
pub const LOOT_MAGNET_RANGE: f32 = 150.0;

/// Peak magnet acceleration (u/s²) applied at zero distance.  Falls off
/// linearly to 0 at [`LOOT_MAGNET_RANGE`].
pub const LOOT_MAGNET_STRENGTH: f32 = 600.0;

/// Seconds an uncollected pickup lingers before it is force-despawned.
pub const LOOT_LIFETIME_SECS: f32 = 30.0;

/// Scatter speed range for freshly dropped pickups.
pub const LOOT_SCATTER_SPEED_MIN: f32 = 50.0;
pub const LOOT_SCATTER_SPEED_MAX: f32 = 100.0;

/// Fraction of the destroyed asteroid's velocity inherited by its loot.
pub const LOOT_MOMENTUM_TRANSFER: f32 = 0.3;

/// Pickup spin is drawn from `±LOOT_SPIN_RANGE` rad/s (~90°/s).
pub const LOOT_SPIN_RANGE: f32 = std::f32::consts::FRAC_PI_2;

/// Radius of the pickup sensor.
pub const LOOT_COLLIDER_RADIUS: f32 = 10.0;

/// Rarity weights `[common, uncommon, rare]` per source size tier.
pub const SMALL_RARITY_WEIGHTS: [f32; 3] = [0.90, 0.10, 0.0];
pub const MEDIUM_RARITY_WEIGHTS: [f32; 3] = [0.70, 0.25, 0.05];
pub const LARGE_RARITY_WEIGHTS: [f32; 3] = [0.50, 0.35, 0.15];

// ── Weapons ───────────────────────────────────────────────────────────────────

/// Damage used when a projectile carries no (or a zero) payload.
pub const DEFAULT_PROJECTILE_DAMAGE: f32 = 10.0;

/// Projectiles spawn this far ahead of the actor along the aim direction.
pub const MUZZLE_OFFSET: f32 = 14.0;

/// Radius of every projectile sensor.
pub const PROJECTILE_COLLIDER_RADIUS: f32 = 3.0;

pub const BLASTER_DAMAGE: f32 = 10.0;
pub const BLASTER_COOLDOWN_SECS: f32 = 0.3;
pub const BLASTER_PROJECTILE_SPEED: f32 = 600.0;
pub const BLASTER_PROJECTILE_LIFETIME: f32 = 1.0;

pub const ROCKET_DAMAGE: f32 = 50.0;
pub const ROCKET_COOLDOWN_SECS: f32 = 1.0;
pub const ROCKET_PROJECTILE_SPEED: f32 = 400.0;
pub const ROCKET_PROJECTILE_LIFETIME: f32 = 2.0;
pub const ROCKET_BLAST_RADIUS: f32 = 80.0;

pub const CLOAK_COOLDOWN_SECS: f32 = 12.0;
pub const CLOAK_DURATION_SECS: f32 = 5.0;

/// Alpha handed to the rendering host while the cloak is engaged.
pub const CLOAK_ALPHA: f32 = 0.2;

// ── Collector ─────────────────────────────────────────────────────────────────

pub const COLLECTOR_MAX_HEALTH: f32 = 100.0;
pub const COLLECTOR_MAX_SHIELD: f32 = 100.0;
pub const COLLECTOR_COLLIDER_RADIUS: f32 = 16.0;
pub const COLLECTOR_LINEAR_DAMPING: f32 = 0.5;

/// Collector-asteroid impact damage = `floor(relative_speed * factor)`.
pub const IMPACT_DAMAGE_FACTOR: f32 = 0.1;

/// Fraction of the impact speed pushed back into the collector along the
/// separation axis.
pub const IMPACT_KNOCKBACK: f32 = 0.5;
