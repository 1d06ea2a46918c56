mod camera;
mod constants;
mod input;
mod shaders;
mod ui;
mod world;

use bevy::{diagnostic::FrameTimeDiagnosticsPlugin, prelude::*, window::PresentMode};
use bevy_atmosphere::prelude::AtmospherePlugin;
use bevy_inspector_egui::{bevy_egui::EguiPlugin, DefaultInspectorConfigPlugin};
use clap::Parser;
use input::{data::SceneAction, keyboard::get_bindings};
use serde::{Deserialize, Serialize};
use shared::{
    bake::MAX_BAKE_RESOLUTION, config::load_or_create, get_scene_folder_paths,
    sets::SceneUpdateSet,
};
use std::collections::BTreeMap;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        help = "Folder holding models/, textures/ and the config files, defaults to ./assets"
    )]
    assets_folder_path: Option<String>,

    #[arg(short, long, help = "Scene configuration file inside the assets folder")]
    config: Option<String>,

    #[arg(
        long,
        value_parser = clap::value_parser!(u32).range(1..=MAX_BAKE_RESOLUTION as i64),
        help = "Overrides the environment bake resolution of the config"
    )]
    bake_resolution: Option<u32>,
}

#[derive(Resource, Serialize, Deserialize)]
pub struct KeyMap {
    #[serde(default = "input::keyboard::default_key_map")]
    pub map: BTreeMap<SceneAction, Vec<KeyCode>>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            map: input::keyboard::default_key_map(),
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut paths = get_scene_folder_paths(args.assets_folder_path, args.config);
    // The asset server resolves relative paths against the manifest or the
    // executable, not the working directory.
    if let Ok(absolute) = std::path::absolute(&paths.assets_folder_path) {
        paths.config_file_path = absolute.join(
            paths
                .config_file_path
                .strip_prefix(&paths.assets_folder_path)
                .unwrap_or(paths.config_file_path.as_path()),
        );
        paths.assets_folder_path = absolute;
    }

    println!(
        "Starting seascape with assets folder: {}",
        paths.assets_folder_path.display()
    );

    let mut config = load_or_create(&paths.config_file_path);
    if let Some(bake_resolution) = args.bake_resolution {
        config.bake_resolution = bake_resolution;
    }
    let key_map = get_bindings(&paths);

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(AssetPlugin {
                file_path: paths.assets_folder_path.to_string_lossy().into_owned(),
                ..Default::default()
            })
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: config.window_title.clone(),
                    present_mode: PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            }),
    );

    app.add_plugins(EguiPlugin {
        enable_multipass_for_primary_context: false,
    })
    .add_plugins(DefaultInspectorConfigPlugin)
    .add_plugins(AtmospherePlugin)
    .add_plugins(FrameTimeDiagnosticsPlugin::default());

    app.configure_sets(
        Update,
        (
            SceneUpdateSet::Input,
            SceneUpdateSet::Environment,
            SceneUpdateSet::Assets,
            SceneUpdateSet::Ui,
        )
            .chain(),
    );

    app.insert_resource(config.environment)
        .insert_resource(config.sky)
        .insert_resource(config.water)
        .insert_resource(config.fog)
        .insert_resource(config)
        .insert_resource(key_map)
        .insert_resource(paths)
        .add_plugins((
            shaders::ShadersPlugin,
            camera::CameraPlugin,
            world::ScenePlugin,
            ui::SceneUiPlugin,
        ))
        .run();
}
