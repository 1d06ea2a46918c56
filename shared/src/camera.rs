//! Orbit camera model.
//!
//! The camera lives on a sphere around a target point. Pointer drags move it
//! along the sphere or slide the target, the wheel changes the radius, and
//! every change is clamped to the configured distance and polar limits.

use std::f32::consts::{PI, TAU};

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{ORBIT_MAX_DISTANCE, ORBIT_MAX_POLAR_ANGLE, ORBIT_MIN_DISTANCE, ORBIT_TARGET};
use crate::environment::spherical_to_cartesian;

/// Keeps the camera off the poles, where the azimuth is undefined.
const POLE_EPSILON: f32 = 1e-6;
const ZOOM_BASE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSettings {
    pub target: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            target: ORBIT_TARGET,
            min_distance: ORBIT_MIN_DISTANCE,
            max_distance: ORBIT_MAX_DISTANCE,
            min_polar_angle: 0.0,
            max_polar_angle: ORBIT_MAX_POLAR_ANGLE,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub target: Vec3,
    pub radius: f32,
    /// Angle from +Y.
    pub polar: f32,
    /// Angle around +Y, measured from +Z towards +X.
    pub azimuth: f32,
}

impl OrbitState {
    pub fn from_eye(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let radius = offset.length();
        let (polar, azimuth) = if radius == 0.0 {
            (0.0, 0.0)
        } else {
            (
                (offset.y / radius).clamp(-1.0, 1.0).acos(),
                offset.x.atan2(offset.z),
            )
        };
        Self {
            target,
            radius,
            polar,
            azimuth,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.target + spherical_to_cartesian(self.radius, self.polar, self.azimuth)
    }

    /// Unit vectors pointing right and up on screen.
    pub fn screen_axes(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.eye()).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        (right, up)
    }

    /// A drag of `delta` pixels; a full viewport height turns a full circle.
    pub fn rotate(&mut self, delta: Vec2, viewport_height: f32, settings: &OrbitSettings) {
        if viewport_height <= 0.0 {
            return;
        }
        self.azimuth -= TAU * delta.x / viewport_height * settings.rotate_speed;
        self.polar -= TAU * delta.y / viewport_height * settings.rotate_speed;
        self.clamp(settings);
    }

    /// Positive `steps` move the camera closer.
    pub fn zoom(&mut self, steps: f32, settings: &OrbitSettings) {
        self.radius *= ZOOM_BASE.powf(steps * settings.zoom_speed);
        self.clamp(settings);
    }

    /// Slides the target so the point under the cursor follows the drag.
    pub fn pan(
        &mut self,
        delta: Vec2,
        viewport_height: f32,
        vertical_fov: f32,
        settings: &OrbitSettings,
    ) {
        if viewport_height <= 0.0 {
            return;
        }
        let target_distance = self.radius * (vertical_fov / 2.0).tan();
        let scale = 2.0 * target_distance / viewport_height * settings.pan_speed;
        let (right, up) = self.screen_axes();
        self.target += -right * delta.x * scale + up * delta.y * scale;
        self.clamp(settings);
    }

    pub fn clamp(&mut self, settings: &OrbitSettings) {
        self.polar = self
            .polar
            .clamp(settings.min_polar_angle, settings.max_polar_angle)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.radius = self.radius.clamp(settings.min_distance, settings.max_distance);
        if self.azimuth > PI {
            self.azimuth -= TAU;
        } else if self.azimuth < -PI {
            self.azimuth += TAU;
        }
    }
}

/// Perspective aspect ratio of a `width` × `height` surface, if it has an area.
pub fn aspect_ratio(width: f32, height: f32) -> Option<f32> {
    (width > 0.0 && height > 0.0).then(|| width / height)
}

/// Position, target and up vector of a camera seeing the mirror image of
/// `eye` looking at `target` in the horizontal plane at `plane_height`.
pub fn mirror_view(eye: Vec3, target: Vec3, plane_height: f32) -> (Vec3, Vec3, Vec3) {
    let mirror = |p: Vec3| Vec3::new(p.x, 2.0 * plane_height - p.y, p.z);
    let mirrored_eye = mirror(eye);
    let mirrored_target = mirror(target);
    // The reflected up vector of a camera looking along -Y would be degenerate.
    let up = if (mirrored_target - mirrored_eye).normalize_or_zero().y.abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::NEG_Y
    };
    (mirrored_eye, mirrored_target, up)
}
