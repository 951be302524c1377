//! The collector: the player-side craft that carries the weapons, soaks
//! impact damage and sweeps up loot.
//!
//! Damage drains the shield first; only the remainder reaches health.  Health
//! is clamped at zero and the collector is destroyed at most once.

use crate::collision::{ASTEROID_GROUPS, COLLECTOR_GROUP, LOOT_GROUP};
use crate::config::CombatConfig;
use crate::weapon::Armament;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Collector {
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub max_shield: f32,
    destroyed: bool,
}

/// How one damage application was split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorHit {
    pub shield_absorbed: f32,
    pub health_lost: f32,
    /// `true` only for the hit that destroyed the collector.
    pub destroyed: bool,
}

impl Collector {
    /// Full health, full shield.
    pub fn new(max_health: f32, max_shield: f32) -> Self {
        Self {
            health: max_health,
            max_health,
            shield: max_shield,
            max_shield,
            destroyed: false,
        }
    }

    pub fn from_config(config: &CombatConfig) -> Self {
        Self::new(config.collector_max_health, config.collector_max_shield)
    }

    pub fn with_shield(mut self, shield: f32) -> Self {
        self.shield = shield.clamp(0.0, self.max_shield);
        self
    }

    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Apply `amount` of damage, shield first.
    ///
    /// Returns `None` for non-positive amounts or a collector that is already
    /// destroyed.
    pub fn take_damage(&mut self, amount: f32) -> Option<CollectorHit> {
        if self.destroyed || amount <= 0.0 {
            return None;
        }
        let shield_absorbed = amount.min(self.shield);
        self.shield -= shield_absorbed;

        let before = self.health;
        self.health = (self.health - (amount - shield_absorbed)).max(0.0);
        let destroyed = self.health <= 0.0;
        if destroyed {
            self.destroyed = true;
        }
        Some(CollectorHit {
            shield_absorbed,
            health_lost: before - self.health,
            destroyed,
        })
    }

    /// Top up the shield (shield-parts pickups).  Returns the amount applied.
    pub fn add_shield(&mut self, amount: f32) -> f32 {
        if self.destroyed {
            return 0.0;
        }
        let applied = amount.max(0.0).min(self.max_shield - self.shield);
        self.shield += applied;
        applied
    }

    /// Restore health up to the maximum.  Returns the amount applied.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.destroyed {
            return 0.0;
        }
        let applied = amount.max(0.0).min(self.max_health - self.health);
        self.health += applied;
        applied
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CollectorDamaged {
    pub collector: Entity,
    pub amount: f32,
    pub shield_absorbed: f32,
    pub health_lost: f32,
    pub shield: f32,
    pub health: f32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CollectorDestroyed {
    pub collector: Entity,
}

#[derive(SystemParam)]
pub struct CollectorNotices<'w> {
    damaged: MessageWriter<'w, CollectorDamaged>,
    destroyed: MessageWriter<'w, CollectorDestroyed>,
}

impl CollectorNotices<'_> {
    /// Apply damage and report it.
    pub fn apply(
        &mut self,
        entity: Entity,
        collector: &mut Collector,
        amount: f32,
    ) -> Option<CollectorHit> {
        let hit = collector.take_damage(amount)?;
        self.damaged.write(CollectorDamaged {
            collector: entity,
            amount,
            shield_absorbed: hit.shield_absorbed,
            health_lost: hit.health_lost,
            shield: collector.shield,
            health: collector.health,
        });
        if hit.destroyed {
            warn!("Collector {entity:?} destroyed");
            self.destroyed.write(CollectorDestroyed { collector: entity });
        }
        Some(hit)
    }
}

/// Spawn the collector with its full armament at `position`.
pub fn spawn_collector(commands: &mut Commands, config: &CombatConfig, position: Vec2) -> Entity {
    commands
        .spawn((
            Collector::from_config(config),
            Armament::from_config(config),
            Transform::from_translation(position.extend(0.0)),
            RigidBody::Dynamic,
            Collider::ball(config.collector_collider_radius),
            Velocity::zero(),
            Damping {
                linear_damping: config.collector_linear_damping,
                angular_damping: config.collector_linear_damping,
            },
            LockedAxes::ROTATION_LOCKED,
            CollisionGroups::new(COLLECTOR_GROUP, ASTEROID_GROUPS | LOOT_GROUP),
            ActiveEvents::COLLISION_EVENTS,
        ))
        .id()
}

pub struct CollectorPlugin;

impl Plugin for CollectorPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CollectorDamaged>()
            .add_message::<CollectorDestroyed>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shield_absorbs_before_health() {
        let mut collector = Collector::new(100.0, 100.0).with_shield(30.0);
        let hit = collector.take_damage(50.0).unwrap();
        assert_eq!(hit.shield_absorbed, 30.0);
        assert_eq!(hit.health_lost, 20.0);
        assert_eq!(collector.shield, 0.0);
        assert_eq!(collector.health, 80.0);

        collector.take_damage(10.0);
        assert_eq!(collector.health, 70.0);
    }

    #[test]
    fn health_clamps_at_zero_and_destroys_once() {
        let mut collector = Collector::new(20.0, 0.0);
        let hit = collector.take_damage(35.0).unwrap();
        assert!(hit.destroyed);
        assert_eq!(hit.health_lost, 20.0);
        assert_eq!(collector.health, 0.0);
        assert_eq!(collector.take_damage(5.0), None);
    }

    #[test]
    fn zero_damage_is_ignored() {
        let mut collector = Collector::new(100.0, 10.0);
        assert_eq!(collector.take_damage(0.0), None);
        assert_eq!(collector.shield, 10.0);
    }

    #[test]
    fn shield_and_heal_respect_maximums() {
        let mut collector = Collector::new(100.0, 50.0).with_shield(40.0);
        collector.take_damage(60.0);
        assert_eq!(collector.add_shield(100.0), 50.0);
        assert_eq!(collector.heal(5.0), 5.0);
        assert_eq!(collector.heal(100.0), 15.0);
        assert_eq!(collector.health, 100.0);
    }
}
