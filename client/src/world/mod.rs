pub mod environment;
pub mod lighting;
pub mod models;
pub mod rendering;

use bevy::prelude::*;

/// Everything that makes up the harbour: sky, lights, water and models.
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            environment::EnvironmentPlugin,
            rendering::ReflectionPlugin,
            rendering::WaterPlugin,
            models::ModelsPlugin,
        ))
        .add_systems(Startup, lighting::spawn_lights);
    }
}
