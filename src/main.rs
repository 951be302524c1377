use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier2d::prelude::*;
use driftfield::asteroid::Asteroid;
use driftfield::collector::{spawn_collector, Collector, CollectorDestroyed};
use driftfield::config::{self, CombatConfig};
use driftfield::loot::LootPickup;
use driftfield::simulation::{CombatSet, SimulationPlugin, SimulationStats};
use driftfield::weapon::{FireWeapon, WeaponSlot};
use std::env;
use std::time::Duration;

/// Frames to run before exiting; unbounded when unset.
const FRAMES_ENV: &str = "DRIFTFIELD_FRAMES";

/// Rockets are only worth it on targets this close.
const ROCKET_RANGE: f32 = 300.0;

/// Autopilot cruise speed toward loot.
const SALVAGE_SPEED: f32 = 120.0;

#[derive(Resource)]
struct FrameBudget(Option<u32>);

fn spawn_world(mut commands: Commands, config: Res<CombatConfig>) {
    spawn_collector(&mut commands, &config, Vec2::ZERO);
}

/// Configure Rapier physics: disable gravity for the space simulation.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

/// Stand-in pilot: shoot at the nearest asteroid, rocket it when close, cloak
/// once the shield is gone, and drift toward the nearest pickup.
fn autopilot_system(
    mut fire: MessageWriter<FireWeapon>,
    mut q_collector: Query<(Entity, &Transform, &Collector, &mut Velocity)>,
    q_asteroids: Query<(&Transform, &Asteroid), Without<Collector>>,
    q_loot: Query<&Transform, (With<LootPickup>, Without<Collector>)>,
) {
    let Ok((actor, transform, collector, mut velocity)) = q_collector.single_mut() else {
        return;
    };
    if collector.is_destroyed() {
        return;
    }
    let here = transform.translation.truncate();

    let nearest_rock = q_asteroids
        .iter()
        .filter(|(_, a)| !a.is_destroyed())
        .map(|(t, _)| t.translation.truncate() - here)
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));
    if let Some(offset) = nearest_rock {
        fire.write(FireWeapon {
            actor,
            slot: WeaponSlot::Primary,
            aim: Some(offset),
        });
        if offset.length() < ROCKET_RANGE {
            fire.write(FireWeapon {
                actor,
                slot: WeaponSlot::Secondary,
                aim: Some(offset),
            });
        }
    }
    if collector.shield <= 0.0 {
        fire.write(FireWeapon {
            actor,
            slot: WeaponSlot::Special,
            aim: None,
        });
    }

    let nearest_loot = q_loot
        .iter()
        .map(|t| t.translation.truncate() - here)
        .min_by(|a, b| a.length_squared().total_cmp(&b.length_squared()));
    if let Some(offset) = nearest_loot {
        velocity.linvel = offset.normalize_or_zero() * SALVAGE_SPEED;
    }
}

fn report_losses_system(mut destroyed: MessageReader<CollectorDestroyed>, stats: Res<SimulationStats>) {
    for event in destroyed.read() {
        warn!("Collector {:?} lost; run so far: {:?}", event.collector, *stats);
    }
}

fn frame_budget_system(
    mut budget: ResMut<FrameBudget>,
    stats: Res<SimulationStats>,
    mut exit: MessageWriter<AppExit>,
) {
    let Some(remaining) = budget.0.as_mut() else {
        return;
    };
    *remaining = remaining.saturating_sub(1);
    if *remaining == 0 {
        info!("Run complete: {:?}", *stats);
        exit.write(AppExit::Success);
    }
}

fn main() {
    let frames = env::var(FRAMES_ENV).ok().and_then(|v| v.parse::<u32>().ok());

    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / 60.0,
        ))),
    )
    .add_plugins((LogPlugin::default(), TransformPlugin))
    // load_combat_config overwrites this from assets/combat.toml (if present)
    // in the Startup schedule.
    .insert_resource(CombatConfig::default())
    .insert_resource(FrameBudget(frames))
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0))
    .add_plugins(SimulationPlugin)
    .add_systems(
        Startup,
        (
            config::load_combat_config,
            spawn_world.after(config::load_combat_config),
            setup_physics_config,
        ),
    )
    .add_systems(Update, autopilot_system.before(CombatSet::Arm))
    .add_systems(
        Update,
        (report_losses_system, frame_budget_system).after(CombatSet::Cleanup),
    );

    app.run();
}
