//! Loot: pickups scattered by destroyed asteroids, pulled toward the collector
//! and swept up on contact.
//!
//! Each destroyed asteroid drops a tier-dependent number of pickups.  Every
//! pickup rolls a rarity from the source tier's weight table, then a uniform
//! resource kind within that rarity, and carries the kind's base value.
//!
//! A pickup is settled exactly once: either collected or expired, never both.

use crate::asteroid::{AsteroidDestroyed, SizeTier};
use crate::catalog::{Rarity, ResourceKind};
use crate::collector::Collector;
use crate::collision::{classify_pair, started_pair, COLLECTOR_GROUP, LOOT_GROUP};
use crate::config::CombatConfig;
use crate::simulation::{CombatSet, SimRng};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;

#[derive(Component, Debug, Clone, PartialEq)]
pub struct LootPickup {
    pub resource: ResourceKind,
    pub value: u32,
    /// Seconds left before the pickup expires.
    pub lifetime: f32,
    settled: bool,
}

impl LootPickup {
    pub fn new(resource: ResourceKind, lifetime: f32) -> Self {
        Self {
            resource,
            value: resource.base_value(),
            lifetime,
            settled: false,
        }
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Claim the pickup for `collector`.  `None` if already settled.
    pub fn collect(&mut self, pickup: Entity, collector: Entity) -> Option<LootCollected> {
        if std::mem::replace(&mut self.settled, true) {
            return None;
        }
        Some(LootCollected {
            pickup,
            collector,
            resource: self.resource,
            value: self.value,
        })
    }

    /// Mark expired.  `false` if already settled.
    pub fn expire(&mut self) -> bool {
        !std::mem::replace(&mut self.settled, true)
    }
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LootSpawned {
    pub pickup: Entity,
    pub position: Vec2,
    pub resource: ResourceKind,
    pub value: u32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LootCollected {
    pub pickup: Entity,
    pub collector: Entity,
    pub resource: ResourceKind,
    pub value: u32,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LootExpired {
    pub pickup: Entity,
    pub resource: ResourceKind,
}

// ── Rolls ─────────────────────────────────────────────────────────────────────

/// Small 1-2, medium 2-3, large 3-4.
pub fn drop_count(tier: SizeTier, rng: &mut impl Rng) -> usize {
    match tier {
        SizeTier::Small => rng.gen_range(1..=2),
        SizeTier::Medium => rng.gen_range(2..=3),
        SizeTier::Large => rng.gen_range(3..=4),
    }
}

/// Weighted rarity draw over `[common, uncommon, rare]`.  An unusable table
/// falls back to common.
pub fn roll_rarity(weights: [f32; 3], rng: &mut impl Rng) -> Rarity {
    match WeightedIndex::new(weights) {
        Ok(dist) => Rarity::ALL[dist.sample(rng)],
        Err(_) => Rarity::Common,
    }
}

/// Uniform pick among the kinds of `rarity`.
pub fn roll_resource(rarity: Rarity, rng: &mut impl Rng) -> ResourceKind {
    let kinds: Vec<ResourceKind> = rarity.kinds().collect();
    kinds.choose(rng).copied().unwrap_or(ResourceKind::Minerals)
}

/// Random heading at a random speed, plus a share of the source's momentum.
pub fn scatter_velocity(source_velocity: Vec2, config: &CombatConfig, rng: &mut impl Rng) -> Vec2 {
    let angle = rng.gen_range(0.0..TAU);
    let speed = rng.gen_range(config.loot_scatter_speed_min..=config.loot_scatter_speed_max);
    Vec2::from_angle(angle) * speed + source_velocity * config.loot_momentum_transfer
}

/// Velocity increment pulling a pickup at `pickup` toward `collector`.
///
/// Zero at or beyond `range`; otherwise `strength * (1 - d / range) * dt`
/// along the line to the collector.
pub fn magnet_pull(pickup: Vec2, collector: Vec2, range: f32, strength: f32, dt: f32) -> Vec2 {
    let offset = collector - pickup;
    let distance = offset.length();
    if range <= 0.0 || distance >= range {
        return Vec2::ZERO;
    }
    offset.normalize_or_zero() * strength * (1.0 - distance / range) * dt
}

/// Scatter loot for an asteroid of `source_scale` destroyed at `position`.
pub fn spawn_loot(
    commands: &mut Commands,
    rng: &mut impl Rng,
    config: &CombatConfig,
    position: Vec2,
    source_scale: f32,
    source_velocity: Vec2,
) -> Vec<LootSpawned> {
    let tier = SizeTier::from_scale(source_scale);
    let weights = config.rarity_weights.get(tier);
    let count = drop_count(tier, rng);

    (0..count)
        .map(|_| {
            let resource = roll_resource(roll_rarity(weights, rng), rng);
            let linvel = scatter_velocity(source_velocity, config, rng);
            let spin = config.loot_spin_range;
            let angvel = rng.gen_range(-spin..=spin);
            let pickup = LootPickup::new(resource, config.loot_lifetime_secs);
            let value = pickup.value;

            let entity = commands
                .spawn((
                    pickup,
                    Transform::from_translation(position.extend(0.1)),
                    RigidBody::KinematicVelocityBased,
                    Velocity { linvel, angvel },
                    Collider::ball(config.loot_collider_radius),
                    Sensor,
                    CollisionGroups::new(LOOT_GROUP, COLLECTOR_GROUP),
                    ActiveCollisionTypes::DYNAMIC_KINEMATIC,
                    ActiveEvents::COLLISION_EVENTS,
                ))
                .id();
            LootSpawned {
                pickup: entity,
                position,
                resource,
                value,
            }
        })
        .collect()
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Drop loot for every asteroid destroyed this tick.
pub fn loot_drop_system(
    mut commands: Commands,
    mut destroyed: MessageReader<AsteroidDestroyed>,
    mut rng: ResMut<SimRng>,
    config: Res<CombatConfig>,
    mut spawned: MessageWriter<LootSpawned>,
) {
    for event in destroyed.read() {
        let drops = spawn_loot(
            &mut commands,
            &mut rng.0,
            &config,
            event.position,
            event.scale,
            event.velocity,
        );
        debug!(
            "Asteroid {:?} dropped {} pickups",
            event.asteroid,
            drops.len()
        );
        spawned.write_batch(drops);
    }
}

/// Pull pickups inside the magnet radius toward the collector.
pub fn loot_magnet_system(
    time: Res<Time>,
    config: Res<CombatConfig>,
    q_collector: Query<&Transform, With<Collector>>,
    mut q_loot: Query<(&Transform, &mut Velocity), (With<LootPickup>, Without<Collector>)>,
) {
    let Ok(collector) = q_collector.single() else {
        return;
    };
    let target = collector.translation.truncate();
    let dt = time.delta_secs();
    for (transform, mut velocity) in q_loot.iter_mut() {
        velocity.linvel += magnet_pull(
            transform.translation.truncate(),
            target,
            config.loot_magnet_range,
            config.loot_magnet_strength,
            dt,
        );
    }
}

/// Age pickups; expire the ones nobody collected in time.
pub fn loot_lifetime_system(
    mut commands: Commands,
    time: Res<Time>,
    mut q_loot: Query<(Entity, &mut LootPickup)>,
    mut expired: MessageWriter<LootExpired>,
) {
    let dt = time.delta_secs();
    for (entity, mut pickup) in q_loot.iter_mut() {
        if pickup.is_settled() {
            continue;
        }
        pickup.lifetime -= dt;
        if pickup.lifetime <= 0.0 && pickup.expire() {
            expired.write(LootExpired {
                pickup: entity,
                resource: pickup.resource,
            });
            commands.entity(entity).try_despawn();
        }
    }
}

/// Collector touching a pickup collects it.
pub fn loot_collection_system(
    mut commands: Commands,
    mut collisions: MessageReader<CollisionEvent>,
    mut q_loot: Query<&mut LootPickup>,
    q_collectors: Query<&Collector>,
    mut collected: MessageWriter<LootCollected>,
) {
    for event in collisions.read() {
        let Some(pair) = started_pair(event) else {
            continue;
        };
        let Some((collector_entity, pickup_entity)) = classify_pair(
            pair,
            |e| q_collectors.contains(e),
            |e| q_loot.contains(e),
        ) else {
            continue;
        };
        if q_collectors
            .get(collector_entity)
            .is_ok_and(Collector::is_destroyed)
        {
            continue;
        }
        let Ok(mut pickup) = q_loot.get_mut(pickup_entity) else {
            continue;
        };
        if let Some(message) = pickup.collect(pickup_entity, collector_entity) {
            collected.write(message);
            commands.entity(pickup_entity).try_despawn();
        }
    }
}

pub struct LootPlugin;

impl Plugin for LootPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<LootSpawned>()
            .add_message::<LootCollected>()
            .add_message::<LootExpired>()
            .add_systems(Update, loot_collection_system.in_set(CombatSet::Resolve))
            .add_systems(
                Update,
                (loot_drop_system, loot_magnet_system, loot_lifetime_system)
                    .chain()
                    .in_set(CombatSet::Aftermath),
            );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{quiet_config, record_messages, recorded, test_app};
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn drop_counts_stay_in_tier_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!((1..=2).contains(&drop_count(SizeTier::Small, &mut rng)));
            assert!((2..=3).contains(&drop_count(SizeTier::Medium, &mut rng)));
            assert!((3..=4).contains(&drop_count(SizeTier::Large, &mut rng)));
        }
    }

    #[test]
    fn small_tier_never_rolls_rare() {
        let weights = CombatConfig::default().rarity_weights.small;
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            assert_ne!(roll_rarity(weights, &mut rng), Rarity::Rare);
        }
    }

    #[test]
    fn broken_weight_table_falls_back_to_common() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(roll_rarity([0.0, 0.0, 0.0], &mut rng), Rarity::Common);
    }

    #[test]
    fn resource_roll_respects_rarity() {
        let mut rng = StdRng::seed_from_u64(4);
        for rarity in Rarity::ALL {
            for _ in 0..50 {
                assert_eq!(roll_resource(rarity, &mut rng).spec().rarity, rarity);
            }
        }
    }

    #[test]
    fn scatter_inherits_source_momentum() {
        let config = CombatConfig {
            loot_scatter_speed_min: 0.0,
            loot_scatter_speed_max: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(5);
        let v = scatter_velocity(Vec2::new(100.0, 0.0), &config, &mut rng);
        assert!((v - Vec2::new(30.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn magnet_is_zero_outside_range_and_stronger_closer() {
        let target = Vec2::ZERO;
        assert_eq!(magnet_pull(Vec2::new(150.0, 0.0), target, 150.0, 600.0, 0.1), Vec2::ZERO);
        assert_eq!(magnet_pull(Vec2::new(400.0, 0.0), target, 150.0, 600.0, 0.1), Vec2::ZERO);

        let near = magnet_pull(Vec2::new(30.0, 0.0), target, 150.0, 600.0, 0.1);
        let far = magnet_pull(Vec2::new(120.0, 0.0), target, 150.0, 600.0, 0.1);
        assert!(near.x < 0.0 && far.x < 0.0);
        assert!(near.length() > far.length());
        // 600 * (1 - 30/150) * 0.1
        assert!((near.length() - 48.0).abs() < 1e-3);
    }

    #[test]
    fn pickup_settles_once() {
        let mut pickup = LootPickup::new(ResourceKind::Crystals, 30.0);
        assert_eq!(pickup.value, 50);
        let collector = Entity::PLACEHOLDER;
        assert!(pickup.collect(Entity::PLACEHOLDER, collector).is_some());
        assert!(pickup.collect(Entity::PLACEHOLDER, collector).is_none());
        assert!(!pickup.expire());
    }

    #[test]
    fn destroyed_asteroid_scatters_loot() {
        let mut app = test_app(quiet_config());
        record_messages::<LootSpawned>(&mut app);

        app.world_mut().write_message(AsteroidDestroyed {
            asteroid: Entity::PLACEHOLDER,
            position: Vec2::new(50.0, -20.0),
            velocity: Vec2::ZERO,
            scale: 1.0,
            resource: ResourceKind::Crystals,
            resource_amount: 20,
        });
        app.update();

        let spawned = recorded::<LootSpawned>(&app);
        assert!((3..=4).contains(&spawned.len()));
        for drop in spawned {
            assert!(drop.value > 0);
            assert_eq!(drop.position, Vec2::new(50.0, -20.0));
            let pickup = app.world().get::<LootPickup>(drop.pickup).unwrap();
            assert_eq!(pickup.value, drop.value);
        }
    }

    #[test]
    fn collector_contact_collects_pickup() {
        let mut app = test_app(quiet_config());
        record_messages::<LootCollected>(&mut app);

        let collector = app
            .world_mut()
            .spawn((Collector::new(100.0, 0.0), Transform::default()))
            .id();
        let pickup = app
            .world_mut()
            .spawn((
                LootPickup::new(ResourceKind::Elements, 30.0),
                Transform::default(),
                Velocity::zero(),
            ))
            .id();
        app.world_mut().write_message(CollisionEvent::Started(
            pickup,
            collector,
            CollisionEventFlags::SENSOR,
        ));
        app.world_mut().write_message(CollisionEvent::Started(
            collector,
            pickup,
            CollisionEventFlags::SENSOR,
        ));
        app.update();

        let collected = recorded::<LootCollected>(&app);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].value, 25);
        assert_eq!(collected[0].collector, collector);
        assert!(app.world().get_entity(pickup).is_err());
    }

    #[test]
    fn uncollected_pickup_expires() {
        let mut app = test_app(quiet_config());
        record_messages::<LootExpired>(&mut app);
        let pickup = app
            .world_mut()
            .spawn((
                LootPickup::new(ResourceKind::Minerals, 0.15),
                Transform::default(),
                Velocity::zero(),
            ))
            .id();

        app.update();
        app.update();
        assert!(recorded::<LootExpired>(&app).is_empty());
        app.update();

        assert_eq!(recorded::<LootExpired>(&app).len(), 1);
        assert!(app.world().get_entity(pickup).is_err());
    }

    #[test]
    fn magnet_system_pulls_nearby_pickups() {
        let mut app = test_app(quiet_config());
        app.world_mut()
            .spawn((Collector::new(100.0, 0.0), Transform::default()));
        let near = app
            .world_mut()
            .spawn((
                LootPickup::new(ResourceKind::Minerals, 30.0),
                Transform::from_xyz(50.0, 0.0, 0.0),
                Velocity::zero(),
            ))
            .id();
        let far = app
            .world_mut()
            .spawn((
                LootPickup::new(ResourceKind::Minerals, 30.0),
                Transform::from_xyz(500.0, 0.0, 0.0),
                Velocity::zero(),
            ))
            .id();

        app.update();
        app.update();

        assert!(app.world().get::<Velocity>(near).unwrap().linvel.x < 0.0);
        assert_eq!(app.world().get::<Velocity>(far).unwrap().linvel, Vec2::ZERO);
    }
}
