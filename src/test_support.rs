//! Headless app scaffolding shared by the unit tests.

use crate::config::CombatConfig;
use crate::simulation::SimulationPlugin;
use bevy::ecs::message::Message;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

/// Fixed simulated step used by every test app.
pub const TEST_STEP_SECS: f32 = 0.1;

/// Every message of type `M` seen so far, in arrival order.
#[derive(Resource)]
pub struct Recorded<M: Message>(pub Vec<M>);

impl<M: Message> Default for Recorded<M> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn record<M: Message + Clone>(mut reader: MessageReader<M>, mut recorded: ResMut<Recorded<M>>) {
    recorded.0.extend(reader.read().cloned());
}

/// Start recording `M` into [`Recorded<M>`] at the end of every frame.
pub fn record_messages<M: Message + Clone>(app: &mut App) {
    app.init_resource::<Recorded<M>>()
        .add_systems(Last, record::<M>);
}

pub fn recorded<M: Message>(app: &App) -> &[M] {
    &app.world().resource::<Recorded<M>>().0
}

/// Seeded config with an empty field so tests place every entity themselves.
pub fn quiet_config() -> CombatConfig {
    CombatConfig {
        seed: Some(0xD21F),
        max_asteroids: 0,
        ..Default::default()
    }
}

/// `MinimalPlugins` + [`SimulationPlugin`] with a fixed step.
///
/// The first `update()` advances time by zero; every later one by
/// [`TEST_STEP_SECS`].
pub fn test_app(config: CombatConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
        TEST_STEP_SECS,
    )));
    app.insert_resource(config);
    app.add_plugins(SimulationPlugin);
    app
}
