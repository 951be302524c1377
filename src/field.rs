//! Asteroid field manager: seeds the field, keeps it populated and enforces
//! spacing at spawn time.
//!
//! ## Lifecycle
//!
//! 1. `PostStartup`: try to place `max_asteroids / 2` asteroids.  Placements
//!    that fail the spacing check are queued as due respawns.
//! 2. An [`AsteroidDestroyed`] for a tracked asteroid untracks it, emits
//!    [`ResourceDropped`] and queues a respawn after `respawn_delay_secs`.
//! 3. Each tick, due respawns attempt one placement each.  A failed attempt
//!    stays due and retries next tick; requests beyond the population cap are
//!    dropped.
//!
//! Spacing is only checked when placing.  Drifting asteroids may later close
//! the gap; nothing re-checks.

use crate::asteroid::{spawn_asteroid_entity, Asteroid, AsteroidDestroyed};
use crate::catalog::ResourceKind;
use crate::collector::Collector;
use crate::config::{AsteroidType, CombatConfig, SpawnArea};
use crate::simulation::{CombatSet, SimRng};
use bevy::prelude::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

/// Live asteroids the field is responsible for, plus queued respawns.
#[derive(Resource, Debug, Default)]
pub struct AsteroidField {
    tracked: Vec<Entity>,
    /// Seconds until each queued respawn is due.
    pending_respawns: Vec<f32>,
}

impl AsteroidField {
    pub fn tracked(&self) -> &[Entity] {
        &self.tracked
    }

    #[inline]
    pub fn population(&self) -> usize {
        self.tracked.len()
    }

    #[inline]
    pub fn pending_respawns(&self) -> usize {
        self.pending_respawns.len()
    }

    pub fn schedule_respawn(&mut self, delay: f32) {
        self.pending_respawns.push(delay.max(0.0));
    }

    /// `true` if `entity` was tracked.
    fn untrack(&mut self, entity: Entity) -> bool {
        let before = self.tracked.len();
        self.tracked.retain(|e| *e != entity);
        self.tracked.len() != before
    }
}

/// Re-announcement of a tracked asteroid's payload for inventory listeners.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ResourceDropped {
    pub position: Vec2,
    pub resource: ResourceKind,
    pub resource_amount: u32,
}

/// Uniform point inside `area`.
pub fn random_spawn_position(area: &SpawnArea, rng: &mut impl Rng) -> Vec2 {
    Vec2::new(
        area.min_x + rng.gen::<f32>() * area.width,
        area.min_y + rng.gen::<f32>() * area.height,
    )
}

/// A candidate is valid when it is at least `min_spacing` from the collector
/// and from every occupied position.
pub fn is_valid_spawn_position(
    candidate: Vec2,
    collector: Option<Vec2>,
    occupied: &[Vec2],
    min_spacing: f32,
) -> bool {
    collector
        .into_iter()
        .chain(occupied.iter().copied())
        .all(|p| p.distance(candidate) >= min_spacing)
}

/// Weighted draw from the type table.  `None` if the table cannot be sampled.
pub fn pick_asteroid_type<'a>(
    types: &'a [AsteroidType],
    rng: &mut impl Rng,
) -> Option<&'a AsteroidType> {
    let dist = WeightedIndex::new(types.iter().map(|t| t.weight)).ok()?;
    types.get(dist.sample(rng))
}

/// One placement attempt.  On success the asteroid is tracked and its position
/// appended to `occupied`.
pub fn spawn_asteroid(
    commands: &mut Commands,
    rng: &mut impl Rng,
    config: &CombatConfig,
    field: &mut AsteroidField,
    collector: Option<Vec2>,
    occupied: &mut Vec<Vec2>,
) -> Option<Entity> {
    if field.population() >= config.max_asteroids {
        return None;
    }
    let position = random_spawn_position(&config.spawn_area, rng);
    if !is_valid_spawn_position(position, collector, occupied, config.min_spacing) {
        debug!(
            "Rejected asteroid spawn at ({:.0}, {:.0}): too close",
            position.x, position.y
        );
        return None;
    }
    let asteroid_type = pick_asteroid_type(&config.asteroid_types, rng)?;
    let entity = spawn_asteroid_entity(commands, rng, config, asteroid_type, position);
    field.tracked.push(entity);
    occupied.push(position);
    debug!(
        "Spawned {} asteroid {entity:?} at ({:.0}, {:.0})",
        asteroid_type.name, position.x, position.y
    );
    Some(entity)
}

fn live_positions(q_asteroids: &Query<(&Transform, &Asteroid)>) -> Vec<Vec2> {
    q_asteroids
        .iter()
        .filter(|(_, asteroid)| !asteroid.is_destroyed())
        .map(|(transform, _)| transform.translation.truncate())
        .collect()
}

/// Place the opening half of the population.
pub fn seed_field_system(
    mut commands: Commands,
    mut rng: ResMut<SimRng>,
    config: Res<CombatConfig>,
    mut field: ResMut<AsteroidField>,
    q_collector: Query<&Transform, With<Collector>>,
    q_asteroids: Query<(&Transform, &Asteroid)>,
) {
    let collector = q_collector.single().ok().map(|t| t.translation.truncate());
    let mut occupied = live_positions(&q_asteroids);
    let target = config.max_asteroids / 2;

    for _ in 0..target {
        if spawn_asteroid(
            &mut commands,
            &mut rng.0,
            &config,
            &mut field,
            collector,
            &mut occupied,
        )
        .is_none()
        {
            field.schedule_respawn(0.0);
        }
    }
    info!(
        "Seeded asteroid field: {} placed, {} queued",
        field.population(),
        field.pending_respawns()
    );
}

/// Untrack destroyed asteroids, re-announce their payload and queue
/// replacements.
pub fn field_destroyed_system(
    mut destroyed: MessageReader<AsteroidDestroyed>,
    mut field: ResMut<AsteroidField>,
    config: Res<CombatConfig>,
    mut dropped: MessageWriter<ResourceDropped>,
) {
    for event in destroyed.read() {
        if !field.untrack(event.asteroid) {
            continue;
        }
        dropped.write(ResourceDropped {
            position: event.position,
            resource: event.resource,
            resource_amount: event.resource_amount,
        });
        field.schedule_respawn(config.respawn_delay_secs);
    }
}

/// Drop tracked entries that vanished without a destruction notice (despawned
/// by the host) and queue their replacements.
pub fn field_prune_system(
    mut field: ResMut<AsteroidField>,
    config: Res<CombatConfig>,
    q_asteroids: Query<&Asteroid>,
) {
    let before = field.population();
    field
        .tracked
        .retain(|e| q_asteroids.get(*e).is_ok_and(|a| !a.is_destroyed()));
    for _ in field.population()..before {
        field.schedule_respawn(config.respawn_delay_secs);
    }
}

/// Count down queued respawns and attempt the due ones.
pub fn field_respawn_system(
    mut commands: Commands,
    time: Res<Time>,
    mut rng: ResMut<SimRng>,
    config: Res<CombatConfig>,
    mut field: ResMut<AsteroidField>,
    q_collector: Query<&Transform, With<Collector>>,
    q_asteroids: Query<(&Transform, &Asteroid)>,
) {
    let dt = time.delta_secs();
    for timer in field.pending_respawns.iter_mut() {
        *timer -= dt;
    }
    let due = field.pending_respawns.iter().filter(|t| **t <= 0.0).count();
    if due == 0 {
        return;
    }
    field.pending_respawns.retain(|t| *t > 0.0);

    let collector = q_collector.single().ok().map(|t| t.translation.truncate());
    let mut occupied = live_positions(&q_asteroids);
    let mut retry = 0;
    for _ in 0..due {
        if field.population() >= config.max_asteroids {
            continue;
        }
        if spawn_asteroid(
            &mut commands,
            &mut rng.0,
            &config,
            &mut field,
            collector,
            &mut occupied,
        )
        .is_none()
        {
            retry += 1;
        }
    }
    for _ in 0..retry {
        field.schedule_respawn(0.0);
    }
}

pub struct FieldPlugin;

impl Plugin for FieldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AsteroidField>()
            .add_message::<ResourceDropped>()
            .add_systems(PostStartup, seed_field_system)
            .add_systems(
                Update,
                (
                    field_destroyed_system,
                    field_prune_system,
                    field_respawn_system,
                )
                    .chain()
                    .in_set(CombatSet::Aftermath),
            );
    }
}
