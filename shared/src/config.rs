//! Scene configuration file.
//!
//! A RON file next to the assets seeds the initial tunables and a few render
//! settings. A missing or unreadable file never stops the scene: defaults are
//! used and written back so there is something to edit next time.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bevy::prelude::Resource;
use bevy_log::{error, info, warn};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

use crate::camera::OrbitSettings;
use crate::constants::{
    DEFAULT_BAKE_RESOLUTION, DEFAULT_ENVIRONMENT_INTENSITY, REFLECTION_RESOLUTION,
    TONE_MAPPING_EXPOSURE,
};
use crate::environment::EnvironmentParameters;
use crate::fog::FogParameters;
use crate::sky::SkyParameters;
use crate::water::WaterParameters;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub window_title: String,
    /// Linear exposure multiplier applied before tone mapping.
    pub exposure: f32,
    pub environment_intensity: f32,
    /// Edge length of the baked environment cube, in texels.
    pub bake_resolution: u32,
    pub reflection_resolution: u32,
    pub environment: EnvironmentParameters,
    pub sky: SkyParameters,
    pub water: WaterParameters,
    pub fog: FogParameters,
    pub orbit: OrbitSettings,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            window_title: "Seascape".to_string(),
            exposure: TONE_MAPPING_EXPOSURE,
            environment_intensity: DEFAULT_ENVIRONMENT_INTENSITY,
            bake_resolution: DEFAULT_BAKE_RESOLUTION,
            reflection_resolution: REFLECTION_RESOLUTION,
            environment: EnvironmentParameters::default(),
            sky: SkyParameters::default(),
            water: WaterParameters::default(),
            fog: FogParameters::default(),
            orbit: OrbitSettings::default(),
        }
    }
}

impl SceneConfig {
    /// Exposure expressed in EV stops, as colour grading expects it.
    pub fn exposure_ev(&self) -> f32 {
        self.exposure.max(f32::MIN_POSITIVE).log2()
    }
}

pub fn parse_config(content: &str) -> Result<SceneConfig, std::io::Error> {
    ron::from_str::<SceneConfig>(content).map_err(std::io::Error::other)
}

pub fn write_config_to_path(config: &SceneConfig, path: &Path) -> Result<(), std::io::Error> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(true)
        .with_enumerate_arrays(false);

    let serialized =
        ron::ser::to_string_pretty(config, pretty_config).map_err(std::io::Error::other)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())
}

/// Reads the config at `path`, falling back to (and persisting) the defaults.
pub fn load_or_create(path: &Path) -> SceneConfig {
    match fs::read_to_string(path) {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                info!("Scene configuration loaded from {:?}", path);
                return config;
            }
            Err(e) => warn!(
                "Scene configuration at {:?} is malformed, using defaults: {}",
                path, e
            ),
        },
        Err(e) => info!("No scene configuration at {:?} ({}), creating one", path, e),
    }

    let config = SceneConfig::default();
    if let Err(e) = write_config_to_path(&config, path) {
        error!(
            "Failed to write default scene configuration to {:?}: {}",
            path, e
        );
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("seascape-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = scratch_dir("missing");
        let path = dir.join("scene.ron");
        let config = load_or_create(&path);
        assert_eq!(config, SceneConfig::default());
        assert!(path.exists());
        assert_eq!(load_or_create(&path), SceneConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_the_rest() {
        let config = parse_config("(exposure: 0.8, fog: (density: 0.01))").unwrap();
        assert_eq!(config.exposure, 0.8);
        assert_eq!(config.fog.density, 0.01);
        assert_eq!(config.water, WaterParameters::default());
        assert_eq!(config.bake_resolution, DEFAULT_BAKE_RESOLUTION);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scene.ron");
        fs::write(&path, "(exposure: \"bright\"").unwrap();
        assert_eq!(load_or_create(&path), SceneConfig::default());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_exposure_in_stops() {
        let config = SceneConfig::default();
        assert!((config.exposure_ev() + 1.0).abs() < 1e-6);
    }
}
