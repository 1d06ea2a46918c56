//! Shaders compiled into the binary.

use bevy::{asset::embedded_asset, prelude::*};

pub mod paths {
    pub const WATER_SHADER: &str = "embedded://seascape/shaders/water.wgsl";
}

pub struct ShadersPlugin;

impl Plugin for ShadersPlugin {
    fn build(&self, app: &mut App) {
        embedded_asset!(app, "water.wgsl");
    }
}
