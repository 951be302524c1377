//! Simulation plugin: message registration, per-tick ordering, shared RNG and
//! run statistics.
//!
//! ## Tick order
//!
//! | Set | Work |
//! |-----|------|
//! | [`CombatSet::Arm`] | weapon cooldowns, fire commands, projectile lifetimes |
//! | [`CombatSet::Resolve`] | overlap routing: projectile hits, collector impacts, loot pickup |
//! | [`CombatSet::Aftermath`] | loot drops, magnet pull, loot expiry, field bookkeeping and respawns |
//! | [`CombatSet::Cleanup`] | despawn inert asteroids, tally stats |
//!
//! Overlaps arrive as rapier [`CollisionEvent`] messages.  The physics host
//! writes them in `PostUpdate`; they are consumed in the next `Update`.  The
//! plugin registers the message type itself so the whole loop also runs
//! headless (tests inject `CollisionEvent::Started` directly).

use crate::asteroid::{AsteroidDestroyed, AsteroidPlugin};
use crate::collector::{CollectorDamaged, CollectorPlugin};
use crate::collision::CollisionPlugin;
use crate::config::CombatConfig;
use crate::field::FieldPlugin;
use crate::loot::{LootCollected, LootExpired, LootPlugin, LootSpawned};
use crate::weapon::{Detonation, WeaponFired, WeaponPlugin};
use bevy::prelude::*;
use bevy_rapier2d::prelude::CollisionEvent;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Per-tick phases, chained in declaration order inside `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    Arm,
    Resolve,
    Aftermath,
    Cleanup,
}

/// The only source of randomness in the simulation.
///
/// Scoped to one `World`, so two apps never share a stream.  Seeded from
/// [`CombatConfig::seed`] when set.
#[derive(Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self(StdRng::from_entropy())
    }
}

/// Running totals for the host's HUD and the end-of-run summary.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationStats {
    pub asteroids_destroyed: u32,
    pub loot_spawned: u32,
    pub loot_collected: u32,
    pub loot_expired: u32,
    /// Sum of the values of every collected pickup.
    pub salvage_value: u32,
    /// Projectiles launched.  Buff activations are not shots.
    pub shots_fired: u32,
    pub detonations: u32,
    pub collector_hits: u32,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>();
        if !app.world().contains_resource::<SimRng>() {
            let rng = app
                .world()
                .resource::<CombatConfig>()
                .seed
                .map(SimRng::seeded)
                .unwrap_or_default();
            app.insert_resource(rng);
        }

        app.add_message::<CollisionEvent>()
            .init_resource::<SimulationStats>()
            .configure_sets(
                Update,
                (
                    CombatSet::Arm,
                    CombatSet::Resolve,
                    CombatSet::Aftermath,
                    CombatSet::Cleanup,
                )
                    .chain(),
            )
            .add_plugins((
                AsteroidPlugin,
                CollectorPlugin,
                WeaponPlugin,
                LootPlugin,
                FieldPlugin,
                CollisionPlugin,
            ))
            .add_systems(Update, tally_stats_system.in_set(CombatSet::Cleanup));
    }
}

/// Fold this tick's notifications into [`SimulationStats`].
#[allow(clippy::too_many_arguments)]
pub fn tally_stats_system(
    mut stats: ResMut<SimulationStats>,
    mut destroyed: MessageReader<AsteroidDestroyed>,
    mut spawned: MessageReader<LootSpawned>,
    mut collected: MessageReader<LootCollected>,
    mut expired: MessageReader<LootExpired>,
    mut fired: MessageReader<WeaponFired>,
    mut detonations: MessageReader<Detonation>,
    mut collector_hits: MessageReader<CollectorDamaged>,
) {
    stats.asteroids_destroyed += destroyed.read().count() as u32;
    stats.loot_spawned += spawned.read().count() as u32;
    for pickup in collected.read() {
        stats.loot_collected += 1;
        stats.salvage_value += pickup.value;
    }
    stats.loot_expired += expired.read().count() as u32;
    stats.shots_fired += fired.read().filter(|f| f.projectile.is_some()).count() as u32;
    stats.detonations += detonations.read().count() as u32;
    stats.collector_hits += collector_hits.read().count() as u32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_rngs_repeat_their_stream() {
        let mut a = SimRng::seeded(99);
        let mut b = SimRng::seeded(99);
        let xs: Vec<u32> = (0..8).map(|_| a.0.gen()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.0.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn plugin_seeds_rng_from_config() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.insert_resource(CombatConfig {
            seed: Some(5),
            max_asteroids: 0,
            ..Default::default()
        });
        app.add_plugins(SimulationPlugin);

        let mut expected = SimRng::seeded(5);
        let drawn: u64 = app.world_mut().resource_mut::<SimRng>().0.gen();
        assert_eq!(drawn, expected.0.gen::<u64>());
    }

    #[test]
    fn independent_apps_do_not_share_messages() {
        let mut first = crate::test_support::test_app(CombatConfig::default());
        let second = crate::test_support::test_app(CombatConfig::default());

        first.world_mut().write_message(WeaponFired {
            actor: Entity::PLACEHOLDER,
            slot: crate::weapon::WeaponSlot::Primary,
            projectile: Some(Entity::PLACEHOLDER),
        });
        first.update();

        assert_eq!(first.world().resource::<SimulationStats>().shots_fired, 1);
        assert_eq!(second.world().resource::<SimulationStats>().shots_fired, 0);
    }

    #[test]
    fn cloak_activation_is_not_a_shot() {
        use crate::weapon::{Armament, FireWeapon, WeaponSlot};

        let mut app = crate::test_support::test_app(crate::test_support::quiet_config());
        let config = app.world().resource::<CombatConfig>().clone();
        let actor = app
            .world_mut()
            .spawn((Armament::from_config(&config), Transform::default()))
            .id();
        for slot in [WeaponSlot::Special, WeaponSlot::Primary] {
            app.world_mut().write_message(FireWeapon {
                actor,
                slot,
                aim: Some(Vec2::Y),
            });
        }
        app.update();

        assert_eq!(app.world().resource::<SimulationStats>().shots_fired, 1);
    }
}
