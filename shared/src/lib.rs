//! Headless building blocks of the seascape scene.
//!
//! Nothing in here touches the GPU: parameters, sun and sky math, the CPU
//! environment bake, the orbit camera model, the asset catalog and the scene
//! configuration file. The client wires these into Bevy.

use std::path::PathBuf;

use bevy::prelude::Resource;

pub mod bake;
pub mod camera;
pub mod config;
pub mod constants;
pub mod environment;
pub mod fog;
pub mod models;
pub mod sets;
pub mod sky;
pub mod water;

pub use constants::*;

#[derive(Resource, Debug, Clone)]
pub struct SceneFolderPaths {
    pub assets_folder_path: PathBuf,
    pub config_file_path: PathBuf,
}

pub fn get_scene_folder_paths(
    assets_folder_path: Option<String>,
    config_file_name: Option<String>,
) -> SceneFolderPaths {
    let assets_folder_path: PathBuf = assets_folder_path
        .unwrap_or_else(|| DEFAULT_ASSETS_FOLDER.to_string())
        .into();
    let config_file_path =
        assets_folder_path.join(config_file_name.unwrap_or_else(|| CONFIG_FILE_NAME.to_string()));

    SceneFolderPaths {
        assets_folder_path,
        config_file_path,
    }
}
