//! Live tunables of the water surface.

use std::ops::RangeInclusive;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Added to the water clock once per rendered frame, whatever the frame took.
pub const WATER_TIME_STEP: f32 = 0.1 / 60.0;

pub const DISTORTION_SCALE_RANGE: RangeInclusive<f32> = 0.0..=8.0;
pub const WATER_TIME_RANGE: RangeInclusive<f32> = 0.0..=100.0;
pub const WATER_SIZE_RANGE: RangeInclusive<f32> = 0.1..=10.0;
pub const WATER_SLIDER_STEP: f64 = 0.1;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterParameters {
    /// How far the normal map bends the reflection.
    pub distortion_scale: f32,
    /// Animation clock of the normal map scroll.
    pub time: f32,
    /// Tiling factor of the normal map.
    pub size: f32,
}

impl Default for WaterParameters {
    fn default() -> Self {
        Self {
            distortion_scale: 3.7,
            time: 0.0,
            size: 1.0,
        }
    }
}

impl WaterParameters {
    pub fn advance(&mut self) {
        self.time += WATER_TIME_STEP;
    }
}
