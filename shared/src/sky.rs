//! Single-scattering sky model.
//!
//! The scattering coefficients are derived from the classic turbidity /
//! rayleigh / mie controls, then fed to a Nishita ray march. The client hands
//! the same coefficients to the atmosphere dome, so what the camera sees and
//! what the environment bake lights the scene with come from one model.

use std::f32::consts::PI;

use bevy::math::{Vec2, Vec3};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Total Rayleigh scattering of the sea-level atmosphere at 680, 550 and 450 nm.
pub const TOTAL_RAYLEIGH: Vec3 = Vec3::new(5.804_543e-6, 1.356_291_2e-5, 3.026_590_2e-5);

/// Wavelength-dependent part of the Mie coefficient (junge exponent 4).
pub const MIE_CONST: Vec3 = Vec3::new(1.839_991_9e14, 2.779_802_4e14, 4.079_048e14);

pub const PLANET_RADIUS: f32 = 6_371e3;
pub const ATMOSPHERE_RADIUS: f32 = 6_471e3;
pub const RAYLEIGH_SCALE_HEIGHT: f32 = 8e3;
pub const MIE_SCALE_HEIGHT: f32 = 1.2e3;
pub const SUN_INTENSITY: f32 = 22.0;

const PRIMARY_STEPS: usize = 16;
const LIGHT_STEPS: usize = 8;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyParameters {
    pub turbidity: f32,
    pub rayleigh: f32,
    pub mie_coefficient: f32,
    pub mie_directional_g: f32,
}

impl Default for SkyParameters {
    fn default() -> Self {
        Self {
            turbidity: 10.0,
            rayleigh: 2.0,
            mie_coefficient: 0.005,
            mie_directional_g: 0.8,
        }
    }
}

impl SkyParameters {
    pub fn rayleigh_coefficient(&self) -> Vec3 {
        TOTAL_RAYLEIGH * self.rayleigh
    }

    pub fn mie_coefficient(&self) -> Vec3 {
        let c = 0.2 * self.turbidity * 10e-18;
        0.434 * c * MIE_CONST * self.mie_coefficient
    }

    /// Mie scattering collapsed to one channel (green) for scalar Mie models.
    pub fn mie_coefficient_scalar(&self) -> f32 {
        self.mie_coefficient().y
    }
}

/// Everything needed to evaluate sky radiance for one sun position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyModel {
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub ray_origin: Vec3,
    pub planet_radius: f32,
    pub atmosphere_radius: f32,
    pub rayleigh_coefficient: Vec3,
    pub rayleigh_scale_height: f32,
    pub mie_coefficient: f32,
    pub mie_scale_height: f32,
    pub mie_direction: f32,
}

impl SkyModel {
    pub fn new(parameters: &SkyParameters, sun_direction: Vec3) -> Self {
        Self {
            sun_direction: sun_direction.normalize_or_zero(),
            sun_intensity: SUN_INTENSITY,
            ray_origin: Vec3::new(0.0, PLANET_RADIUS + 1e3, 0.0),
            planet_radius: PLANET_RADIUS,
            atmosphere_radius: ATMOSPHERE_RADIUS,
            rayleigh_coefficient: parameters.rayleigh_coefficient(),
            rayleigh_scale_height: RAYLEIGH_SCALE_HEIGHT,
            mie_coefficient: parameters.mie_coefficient_scalar(),
            mie_scale_height: MIE_SCALE_HEIGHT,
            mie_direction: parameters.mie_directional_g,
        }
    }

    /// Linear radiance arriving from `direction`.
    pub fn radiance(&self, direction: Vec3) -> Vec3 {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Vec3::ZERO;
        }

        let mut p = ray_sphere_intersect(self.ray_origin, dir, self.atmosphere_radius);
        if p.x > p.y {
            return Vec3::ZERO;
        }
        // The march starts at the observer and stops at the ground if it is ahead.
        p.x = p.x.max(0.0);
        let ground = ray_sphere_intersect(self.ray_origin, dir, self.planet_radius);
        if ground.x > 0.0 && ground.x <= ground.y {
            p.y = p.y.min(ground.x);
        }
        let primary_step = (p.y - p.x) / PRIMARY_STEPS as f32;

        let mu = dir.dot(self.sun_direction);
        let mumu = mu * mu;
        let g = self.mie_direction;
        let gg = g * g;
        let phase_rayleigh = 3.0 / (16.0 * PI) * (1.0 + mumu);
        let phase_mie = 3.0 / (8.0 * PI) * ((1.0 - gg) * (mumu + 1.0))
            / ((1.0 + gg - 2.0 * mu * g).powf(1.5) * (2.0 + gg));

        let mut total_rayleigh = Vec3::ZERO;
        let mut total_mie = Vec3::ZERO;
        let mut optical_rayleigh = 0.0;
        let mut optical_mie = 0.0;
        let mut primary_time = p.x;

        for _ in 0..PRIMARY_STEPS {
            let sample = self.ray_origin + dir * (primary_time + primary_step * 0.5);
            let height = sample.length() - self.planet_radius;

            let step_rayleigh = (-height / self.rayleigh_scale_height).exp() * primary_step;
            let step_mie = (-height / self.mie_scale_height).exp() * primary_step;
            optical_rayleigh += step_rayleigh;
            optical_mie += step_mie;

            let light_step = ray_sphere_intersect(sample, self.sun_direction, self.atmosphere_radius)
                .y
                / LIGHT_STEPS as f32;
            let mut light_time = 0.0;
            let mut light_rayleigh = 0.0;
            let mut light_mie = 0.0;
            for _ in 0..LIGHT_STEPS {
                let light_sample = sample + self.sun_direction * (light_time + light_step * 0.5);
                let light_height = light_sample.length() - self.planet_radius;
                light_rayleigh += (-light_height / self.rayleigh_scale_height).exp() * light_step;
                light_mie += (-light_height / self.mie_scale_height).exp() * light_step;
                light_time += light_step;
            }

            let attenuation = (-(Vec3::splat(self.mie_coefficient * (optical_mie + light_mie))
                + self.rayleigh_coefficient * (optical_rayleigh + light_rayleigh)))
                .exp();
            total_rayleigh += step_rayleigh * attenuation;
            total_mie += step_mie * attenuation;
            primary_time += primary_step;
        }

        self.sun_intensity
            * (phase_rayleigh * self.rayleigh_coefficient * total_rayleigh
                + phase_mie * self.mie_coefficient * total_mie)
    }
}

/// Near and far distances along `dir` where the ray meets a sphere centred on
/// the origin. A miss comes back as `(1e5, -1e5)`.
fn ray_sphere_intersect(origin: Vec3, dir: Vec3, radius: f32) -> Vec2 {
    let a = dir.dot(dir);
    let b = 2.0 * dir.dot(origin);
    let c = origin.dot(origin) - radius * radius;
    let d = b * b - 4.0 * a * c;
    if d < 0.0 {
        return Vec2::new(1e5, -1e5);
    }
    let sqrt_d = d.sqrt();
    Vec2::new((-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::sun_direction;

    fn model(elevation: f32) -> SkyModel {
        SkyModel::new(&SkyParameters::default(), sun_direction(elevation, 180.0))
    }

    #[test]
    fn test_default_coefficients() {
        let params = SkyParameters::default();
        let rayleigh = params.rayleigh_coefficient();
        assert!((rayleigh.x - 1.160_9e-5).abs() < 1e-8);
        let mie = params.mie_coefficient();
        // 0.434 * 2e-17 * 2.78e14 * 0.005
        assert!((mie.y - 1.206_4e-5).abs() < 1e-8);
        assert!(mie.x < mie.y && mie.y < mie.z);
    }

    #[test]
    fn test_radiance_is_finite_and_positive() {
        let sky = model(30.0);
        for dir in [Vec3::Y, Vec3::X, Vec3::NEG_Z, Vec3::new(0.3, -0.2, 0.9)] {
            let l = sky.radiance(dir);
            assert!(l.is_finite(), "{dir:?} -> {l:?}");
            assert!(l.min_element() >= 0.0, "{dir:?} -> {l:?}");
        }
    }

    #[test]
    fn test_daylight_zenith_is_blue() {
        let l = model(60.0).radiance(Vec3::Y);
        assert!(l.z > l.x);
    }

    #[test]
    fn test_brighter_towards_the_sun() {
        let sky = model(20.0);
        let towards = sky.radiance(sun_direction(20.0, 180.0));
        let away = sky.radiance(sun_direction(20.0, 0.0));
        assert!(towards.length() > away.length());
    }

    #[test]
    fn test_zero_direction() {
        assert_eq!(model(10.0).radiance(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_sphere_miss() {
        let hit = ray_sphere_intersect(Vec3::new(0.0, 10.0, 0.0), Vec3::X, 1.0);
        assert!(hit.x > hit.y);
    }
}
