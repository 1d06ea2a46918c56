use bevy::render::view::Layer;

/// Render layer of everything the water reflects.
pub const SCENE_LAYER: Layer = 0;
/// Render layer of the water surface itself, hidden from the mirror camera.
pub const WATER_LAYER: Layer = 1;
/// Each camera draws its own sky dome; these keep them apart.
pub const MAIN_SKY_LAYER: Layer = 2;
pub const REFLECTION_SKY_LAYER: Layer = 3;

/// Height of the water plane.
pub const WATER_LEVEL: f32 = 0.0;

pub const AMBIENT_BRIGHTNESS: f32 = 80.0;

/// Scroll delta of one wheel notch on pixel-precise devices.
pub const PIXELS_PER_LINE: f32 = 100.0;
