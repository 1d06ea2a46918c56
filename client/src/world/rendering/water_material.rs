use bevy::{
    prelude::*,
    render::render_resource::{AsBindGroup, ShaderRef, ShaderType},
};
use shared::{hex_to_srgb_u8, water::WaterParameters, WATER_COLOR, WATER_SUN_COLOR};

use crate::shaders::paths::WATER_SHADER;

/// Uniform block of the water shader.
#[derive(Clone, Copy, Debug, ShaderType)]
pub struct WaterMaterialUniform {
    /// Clip space of the mirror camera, used to look up the reflection.
    pub mirror_clip_from_world: Mat4,
    pub sun_direction: Vec3,
    pub time: f32,
    pub sun_color: Vec3,
    pub distortion_scale: f32,
    pub water_color: Vec3,
    /// Tiling factor of the normal map.
    pub size: f32,
    pub alpha: f32,
}

fn linear_hex(hex: u32) -> Vec3 {
    let [r, g, b] = hex_to_srgb_u8(hex);
    let linear = Color::srgb_u8(r, g, b).to_linear();
    Vec3::new(linear.red, linear.green, linear.blue)
}

impl WaterMaterialUniform {
    pub fn new(water: &WaterParameters, sun_direction: Vec3) -> Self {
        let mut uniform = Self {
            mirror_clip_from_world: Mat4::IDENTITY,
            sun_direction,
            time: 0.0,
            sun_color: linear_hex(WATER_SUN_COLOR),
            distortion_scale: 0.0,
            water_color: linear_hex(WATER_COLOR),
            size: 1.0,
            alpha: 1.0,
        };
        uniform.apply(water);
        uniform
    }

    /// Copies the per-frame tunables.
    pub fn apply(&mut self, water: &WaterParameters) {
        self.time = water.time;
        self.distortion_scale = water.distortion_scale;
        self.size = water.size;
    }
}

#[derive(Asset, AsBindGroup, TypePath, Debug, Clone)]
pub struct WaterMaterial {
    #[uniform(0)]
    pub uniform: WaterMaterialUniform,
    #[texture(1)]
    #[sampler(2)]
    pub normals: Handle<Image>,
    #[texture(3)]
    #[sampler(4)]
    pub reflection: Handle<Image>,
}

impl Material for WaterMaterial {
    fn fragment_shader() -> ShaderRef {
        WATER_SHADER.into()
    }
}

/// The single water material of the scene.
#[derive(Resource)]
pub struct WaterMaterialResource {
    pub handle: Handle<WaterMaterial>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_tracks_parameters() {
        let water = WaterParameters {
            distortion_scale: 2.0,
            time: 5.0,
            size: 3.0,
        };
        let uniform = WaterMaterialUniform::new(&water, Vec3::Y);
        assert_eq!(uniform.time, 5.0);
        assert_eq!(uniform.distortion_scale, 2.0);
        assert_eq!(uniform.size, 3.0);
        assert_eq!(uniform.sun_direction, Vec3::Y);
        assert_eq!(uniform.alpha, 1.0);
    }

    #[test]
    fn test_colours_are_linear() {
        let uniform = WaterMaterialUniform::new(&WaterParameters::default(), Vec3::Y);
        // 0xffff99: full red and green, blue well under its sRGB value of 0.6.
        assert!((uniform.sun_color.x - 1.0).abs() < 1e-6);
        assert!(uniform.sun_color.z < 0.6 && uniform.sun_color.z > 0.2);
        assert_eq!(uniform.water_color.x, 0.0);
    }
}
