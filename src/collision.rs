//! Overlap routing.
//!
//! The physics host reports overlaps as rapier [`CollisionEvent`]s.  Each
//! resolver here reads `Started` events, matches the pair against the entity
//! kinds it cares about (in either order) and skips anything that is no
//! longer live.  Unknown or half-despawned pairs are dropped silently.
//!
//! | Pair | Outcome |
//! |------|---------|
//! | projectile + asteroid | bolt damages the asteroid, rocket detonates; the projectile dissolves |
//! | collector + asteroid | impact damage and knockback on the collector |
//! | collector + loot | handled by [`crate::loot::loot_collection_system`] |
//!
//! Asteroids sit on one of three membership layers by size tier so the host
//! can tell the tiers apart; all three collide with each other, the collector
//! and projectiles.

use crate::asteroid::{Asteroid, AsteroidNotices, SizeTier};
use crate::collector::{Collector, CollectorNotices};
use crate::config::CombatConfig;
use crate::simulation::CombatSet;
use crate::weapon::{Projectile, ProjectileKind, ProjectileSink};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

pub const ASTEROID_SMALL_GROUP: Group = Group::GROUP_1;
pub const COLLECTOR_GROUP: Group = Group::GROUP_2;
pub const PROJECTILE_GROUP: Group = Group::GROUP_3;
pub const LOOT_GROUP: Group = Group::GROUP_4;
pub const ASTEROID_MEDIUM_GROUP: Group = Group::GROUP_6;
pub const ASTEROID_LARGE_GROUP: Group = Group::GROUP_7;

/// Every asteroid layer.
pub const ASTEROID_GROUPS: Group = ASTEROID_SMALL_GROUP
    .union(ASTEROID_MEDIUM_GROUP)
    .union(ASTEROID_LARGE_GROUP);

pub fn tier_group(tier: SizeTier) -> Group {
    match tier {
        SizeTier::Small => ASTEROID_SMALL_GROUP,
        SizeTier::Medium => ASTEROID_MEDIUM_GROUP,
        SizeTier::Large => ASTEROID_LARGE_GROUP,
    }
}

pub fn asteroid_collision_groups(tier: SizeTier) -> CollisionGroups {
    CollisionGroups::new(
        tier_group(tier),
        ASTEROID_GROUPS | COLLECTOR_GROUP | PROJECTILE_GROUP,
    )
}

/// The entity pair of a `Started` event.
#[inline]
pub fn started_pair(event: &CollisionEvent) -> Option<(Entity, Entity)> {
    match event {
        CollisionEvent::Started(e1, e2, _) => Some((*e1, *e2)),
        CollisionEvent::Stopped(..) => None,
    }
}

/// Order `(e1, e2)` as `(a, b)` where `is_a(a)` and `is_b(b)` hold, if either
/// ordering matches.
pub fn classify_pair(
    (e1, e2): (Entity, Entity),
    is_a: impl Fn(Entity) -> bool,
    is_b: impl Fn(Entity) -> bool,
) -> Option<(Entity, Entity)> {
    if is_a(e1) && is_b(e2) {
        Some((e1, e2))
    } else if is_a(e2) && is_b(e1) {
        Some((e2, e1))
    } else {
        None
    }
}

/// Projectile hits.  A bolt deals its payload (or the configured default when
/// it carries none); a rocket detonates instead.  Either way the projectile
/// dissolves, so a single projectile resolves at most one hit.
pub fn projectile_asteroid_hit_system(
    mut collisions: MessageReader<CollisionEvent>,
    mut q_projectiles: Query<(&mut Projectile, &Transform)>,
    mut q_asteroids: Query<(&mut Asteroid, &Transform, Option<&Velocity>)>,
    config: Res<CombatConfig>,
    mut notices: AsteroidNotices,
    mut sink: ProjectileSink,
) {
    for event in collisions.read() {
        let Some(pair) = started_pair(event) else {
            continue;
        };
        let Some((projectile_entity, asteroid_entity)) = classify_pair(
            pair,
            |e| q_projectiles.contains(e),
            |e| q_asteroids.contains(e),
        ) else {
            continue;
        };

        let Ok((mut projectile, projectile_transform)) = q_projectiles.get_mut(projectile_entity)
        else {
            continue;
        };
        let Ok((mut asteroid, asteroid_transform, velocity)) = q_asteroids.get_mut(asteroid_entity)
        else {
            continue;
        };
        if projectile.is_dissolving() || asteroid.is_destroyed() {
            continue;
        }

        if projectile.kind == ProjectileKind::Bolt {
            let amount = projectile.payload(config.default_projectile_damage);
            notices.strike(
                asteroid_entity,
                &mut asteroid,
                asteroid_transform.translation.truncate(),
                velocity.map(|v| v.linvel).unwrap_or(Vec2::ZERO),
                amount,
            );
        }
        sink.finish(
            projectile_entity,
            &mut projectile,
            projectile_transform.translation.truncate(),
        );
    }
}

/// Emitted for every collector-asteroid contact, including ones too gentle to
/// do damage.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct CollectorAsteroidImpact {
    pub collector: Entity,
    pub asteroid: Entity,
    pub impact_speed: f32,
    pub damage: f32,
}

/// Collector-asteroid contacts: damage `floor(relative_speed * factor)` and a
/// knockback along the separation axis.
pub fn collector_asteroid_impact_system(
    mut collisions: MessageReader<CollisionEvent>,
    mut q_collectors: Query<(&mut Collector, &Transform, Option<&mut Velocity>), Without<Asteroid>>,
    q_asteroids: Query<(&Asteroid, &Transform, Option<&Velocity>), Without<Collector>>,
    config: Res<CombatConfig>,
    mut impacts: MessageWriter<CollectorAsteroidImpact>,
    mut notices: CollectorNotices,
) {
    for event in collisions.read() {
        let Some(pair) = started_pair(event) else {
            continue;
        };
        let Some((collector_entity, asteroid_entity)) = classify_pair(
            pair,
            |e| q_collectors.contains(e),
            |e| q_asteroids.contains(e),
        ) else {
            continue;
        };

        let Ok((mut collector, collector_transform, collector_velocity)) =
            q_collectors.get_mut(collector_entity)
        else {
            continue;
        };
        let Ok((asteroid, asteroid_transform, asteroid_velocity)) = q_asteroids.get(asteroid_entity)
        else {
            continue;
        };
        if collector.is_destroyed() || asteroid.is_destroyed() {
            continue;
        }

        let relative = collector_velocity.as_ref().map(|v| v.linvel).unwrap_or(Vec2::ZERO)
            - asteroid_velocity.map(|v| v.linvel).unwrap_or(Vec2::ZERO);
        let impact_speed = relative.length();
        let damage = (impact_speed * config.impact_damage_factor).floor();

        let normal = (collector_transform.translation - asteroid_transform.translation)
            .truncate()
            .normalize_or_zero();
        if let Some(mut velocity) = collector_velocity {
            velocity.linvel += normal * impact_speed * config.impact_knockback;
        }

        impacts.write(CollectorAsteroidImpact {
            collector: collector_entity,
            asteroid: asteroid_entity,
            impact_speed,
            damage,
        });
        if damage > 0.0 {
            notices.apply(collector_entity, &mut collector, damage);
        }
    }
}

pub struct CollisionPlugin;

impl Plugin for CollisionPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CollectorAsteroidImpact>().add_systems(
            Update,
            (
                projectile_asteroid_hit_system,
                collector_asteroid_impact_system,
            )
                .chain()
                .in_set(CombatSet::Resolve),
        );
    }
}
