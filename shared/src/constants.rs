use std::f32::consts::PI;

use bevy::math::Vec3;

pub const DEFAULT_ASSETS_FOLDER: &str = "assets";
pub const CONFIG_FILE_NAME: &str = "scene.ron";
pub const BINDS_FILE_NAME: &str = "binds.ron";

pub const CAMERA_FOV_DEGREES: f32 = 55.0;
pub const CAMERA_NEAR: f32 = 1.0;
pub const CAMERA_FAR: f32 = 20_000.0;
pub const CAMERA_START: Vec3 = Vec3::new(30.0, 30.0, 100.0);

pub const ORBIT_TARGET: Vec3 = Vec3::new(0.0, 10.0, 0.0);
pub const ORBIT_MIN_DISTANCE: f32 = 40.0;
pub const ORBIT_MAX_DISTANCE: f32 = 200.0;
pub const ORBIT_MAX_POLAR_ANGLE: f32 = PI * 0.495;

pub const DIRECTIONAL_LIGHT_POSITION: Vec3 = Vec3::new(5.0, 10.0, 7.5);
pub const AMBIENT_LIGHT_COLOR: u32 = 0x404040;

pub const TONE_MAPPING_EXPOSURE: f32 = 0.5;

/// Side length of the water plane and scale of the sky dome.
pub const WORLD_EXTENT: f32 = 10_000.0;
pub const WATER_NORMALS_PATH: &str = "textures/waternormals.jpg";
pub const WATER_SUN_COLOR: u32 = 0xffff99;
pub const WATER_COLOR: u32 = 0x001e0f;
pub const REFLECTION_RESOLUTION: u32 = 512;

pub const DEFAULT_BAKE_RESOLUTION: u32 = 64;
pub const DEFAULT_ENVIRONMENT_INTENSITY: f32 = 900.0;

/// Splits a `0xRRGGBB` literal into its sRGB bytes.
pub const fn hex_to_srgb_u8(hex: u32) -> [u8; 3] {
    [
        ((hex >> 16) & 0xff) as u8,
        ((hex >> 8) & 0xff) as u8,
        (hex & 0xff) as u8,
    ]
}
