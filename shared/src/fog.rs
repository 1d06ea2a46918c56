use std::ops::RangeInclusive;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

pub const FOG_DENSITY_RANGE: RangeInclusive<f32> = 0.0..=0.06;
pub const FOG_DENSITY_STEP: f64 = 0.00025;
pub const FOG_COLOR: u32 = 0xAAAAAA;

/// Exponential-squared fog, sampled by the renderer every frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FogParameters {
    pub density: f32,
}

impl Default for FogParameters {
    fn default() -> Self {
        Self { density: 0.0025 }
    }
}

impl FogParameters {
    /// Fraction of the fog colour mixed in at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        1.0 - (-d * d).exp()
    }
}
