//! Destructible asteroid: health bookkeeping, size tiers and the damage /
//! destruction notifications the rest of the loop listens for.
//!
//! An asteroid is destroyed at most once.  Destruction flips it inert: later
//! hits are ignored and it is despawned in [`CombatSet::Cleanup`] of the same
//! tick, after loot and the field manager have consumed its
//! [`AsteroidDestroyed`] notice.

use crate::catalog::ResourceKind;
use crate::collision::asteroid_collision_groups;
use crate::config::{AsteroidType, CombatConfig};
use crate::constants::{MEDIUM_TIER_MAX_SCALE, SMALL_TIER_MAX_SCALE};
use crate::simulation::CombatSet;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

/// Size class derived from an asteroid's scale.  Drives physics parameters,
/// loot counts and rarity weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn from_scale(scale: f32) -> Self {
        if scale < SMALL_TIER_MAX_SCALE {
            SizeTier::Small
        } else if scale < MEDIUM_TIER_MAX_SCALE {
            SizeTier::Medium
        } else {
            SizeTier::Large
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Asteroid {
    pub max_health: f32,
    /// Raw remaining health; may go negative on the destroying hit.
    pub health: f32,
    pub scale: f32,
    pub resource: ResourceKind,
    pub resource_amount: u32,
    destroyed: bool,
}

/// Result of an accepted hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    pub health_remaining: f32,
    /// `true` only for the hit that destroyed the asteroid.
    pub destroyed: bool,
}

impl Asteroid {
    pub fn new(health: f32, scale: f32, resource: ResourceKind, resource_amount: u32) -> Self {
        Self {
            max_health: health,
            health,
            scale,
            resource,
            resource_amount,
            destroyed: false,
        }
    }

    pub fn from_type(asteroid_type: &AsteroidType) -> Self {
        Self::new(
            asteroid_type.health,
            asteroid_type.scale,
            asteroid_type.resource,
            asteroid_type.resource_amount,
        )
    }

    #[inline]
    pub fn tier(&self) -> SizeTier {
        SizeTier::from_scale(self.scale)
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Health in `[0, 1]` for health bars.
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Subtract `amount` and destroy the asteroid if health reaches zero.
    ///
    /// Returns `None` when the asteroid was already destroyed or `amount` is
    /// not positive; the hit is ignored entirely.
    pub fn damage(&mut self, amount: f32) -> Option<DamageReport> {
        if self.destroyed || amount.is_nan() || amount <= 0.0 {
            return None;
        }
        self.health -= amount;
        let destroyed = self.health <= 0.0 && self.destroy();
        Some(DamageReport {
            health_remaining: self.health,
            destroyed,
        })
    }

    /// Flip to the destroyed state.  Returns `false` if it already was.
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        true
    }
}

/// An accepted hit on a live asteroid.  Also emitted for the destroying hit.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct AsteroidDamaged {
    pub asteroid: Entity,
    pub position: Vec2,
    pub damage: f32,
    pub health_remaining: f32,
}

/// Emitted exactly once per asteroid, on the tick it is destroyed.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct AsteroidDestroyed {
    pub asteroid: Entity,
    pub position: Vec2,
    pub velocity: Vec2,
    pub scale: f32,
    pub resource: ResourceKind,
    pub resource_amount: u32,
}

/// Writers for the asteroid notifications, bundled so every damage path
/// reports the same way.
#[derive(SystemParam)]
pub struct AsteroidNotices<'w> {
    damaged: MessageWriter<'w, AsteroidDamaged>,
    destroyed: MessageWriter<'w, AsteroidDestroyed>,
}

impl AsteroidNotices<'_> {
    /// Apply a hit and emit the matching notifications.
    pub fn strike(
        &mut self,
        entity: Entity,
        asteroid: &mut Asteroid,
        position: Vec2,
        velocity: Vec2,
        amount: f32,
    ) -> Option<DamageReport> {
        let report = asteroid.damage(amount)?;
        self.damaged.write(AsteroidDamaged {
            asteroid: entity,
            position,
            damage: amount,
            health_remaining: report.health_remaining,
        });
        if report.destroyed {
            self.announce_destroyed(entity, asteroid, position, velocity);
        }
        Some(report)
    }

    /// Destroy outright (no damage notice).  Returns `false` if the asteroid
    /// was already destroyed.
    pub fn destroy(
        &mut self,
        entity: Entity,
        asteroid: &mut Asteroid,
        position: Vec2,
        velocity: Vec2,
    ) -> bool {
        if !asteroid.destroy() {
            return false;
        }
        self.announce_destroyed(entity, asteroid, position, velocity);
        true
    }

    fn announce_destroyed(
        &mut self,
        entity: Entity,
        asteroid: &Asteroid,
        position: Vec2,
        velocity: Vec2,
    ) {
        debug!(
            "Asteroid {entity:?} destroyed at ({:.0}, {:.0})",
            position.x, position.y
        );
        self.destroyed.write(AsteroidDestroyed {
            asteroid: entity,
            position,
            velocity,
            scale: asteroid.scale,
            resource: asteroid.resource,
            resource_amount: asteroid.resource_amount,
        });
    }
}

/// Spawn a live asteroid of `asteroid_type` at `position` with a small random
/// drift and spin.
pub fn spawn_asteroid_entity(
    commands: &mut Commands,
    rng: &mut impl Rng,
    config: &CombatConfig,
    asteroid_type: &AsteroidType,
    position: Vec2,
) -> Entity {
    let asteroid = Asteroid::from_type(asteroid_type);
    let tier = asteroid.tier();
    let physics = config.tier_physics.get(tier);
    let drift = config.asteroid_drift_range;
    let spin = config.asteroid_spin_range;
    let linvel = Vec2::new(rng.gen_range(-drift..=drift), rng.gen_range(-drift..=drift));
    let angvel = rng.gen_range(-spin..=spin);
    let radius = config.asteroid_base_radius * asteroid.scale;

    commands
        .spawn((
            asteroid,
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Dynamic,
            Collider::ball(radius),
            Restitution::coefficient(physics.restitution),
            Damping {
                linear_damping: physics.linear_damping,
                angular_damping: physics.angular_damping,
            },
            Velocity { linvel, angvel },
            asteroid_collision_groups(tier),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

/// Remove every destroyed asteroid.  Runs after all consumers of this tick's
/// [`AsteroidDestroyed`] notices.
pub fn despawn_destroyed_asteroids_system(
    mut commands: Commands,
    q_asteroids: Query<(Entity, &Asteroid)>,
) {
    for (entity, asteroid) in q_asteroids.iter() {
        if asteroid.is_destroyed() {
            commands.entity(entity).try_despawn();
        }
    }
}

pub struct AsteroidPlugin;

impl Plugin for AsteroidPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<AsteroidDamaged>()
            .add_message::<AsteroidDestroyed>()
            .add_systems(
                Update,
                despawn_destroyed_asteroids_system.in_set(CombatSet::Cleanup),
            );
    }
}
