//! Sun placement driven by the Sky folder of the parameter panel.
//!
//! Elevation and azimuth are in degrees. Unlike the water and fog tunables,
//! these are not sampled every frame: a change has to be announced with
//! [`SunMoved`] so the sky, the water highlight and the baked environment
//! lighting are recomputed once.

use std::ops::RangeInclusive;

use bevy::math::Vec3;
use bevy::prelude::{Event, Resource};
use serde::{Deserialize, Serialize};

pub const ELEVATION_RANGE: RangeInclusive<f32> = 0.0..=90.0;
pub const AZIMUTH_RANGE: RangeInclusive<f32> = -180.0..=180.0;
pub const SUN_SLIDER_STEP: f64 = 0.1;

/// Emitted whenever elevation or azimuth changed.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SunMoved;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentParameters {
    pub elevation: f32,
    pub azimuth: f32,
}

impl Default for EnvironmentParameters {
    fn default() -> Self {
        Self {
            elevation: 0.0,
            azimuth: 180.0,
        }
    }
}

impl EnvironmentParameters {
    /// Returns true when the stored value changed.
    pub fn set_elevation(&mut self, elevation: f32) -> bool {
        let elevation = elevation.clamp(*ELEVATION_RANGE.start(), *ELEVATION_RANGE.end());
        let changed = elevation != self.elevation;
        self.elevation = elevation;
        changed
    }

    /// Returns true when the stored value changed.
    pub fn set_azimuth(&mut self, azimuth: f32) -> bool {
        let azimuth = azimuth.clamp(*AZIMUTH_RANGE.start(), *AZIMUTH_RANGE.end());
        let changed = azimuth != self.azimuth;
        self.azimuth = azimuth;
        changed
    }

    pub fn sun_direction(&self) -> Vec3 {
        sun_direction(self.elevation, self.azimuth)
    }
}

/// Point on the unit sphere for a polar angle `phi` (from +Y) and an
/// azimuth `theta` (from +Z towards +X).
pub fn spherical_to_cartesian(radius: f32, phi: f32, theta: f32) -> Vec3 {
    let sin_phi_radius = phi.sin() * radius;
    Vec3::new(
        sin_phi_radius * theta.sin(),
        phi.cos() * radius,
        sin_phi_radius * theta.cos(),
    )
}

/// Unit vector pointing at the sun.
pub fn sun_direction(elevation_degrees: f32, azimuth_degrees: f32) -> Vec3 {
    let phi = (90.0 - elevation_degrees).to_radians();
    let theta = azimuth_degrees.to_radians();
    spherical_to_cartesian(1.0, phi, theta)
}
