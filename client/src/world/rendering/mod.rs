pub mod reflection;
pub mod water;
pub mod water_material;

pub use reflection::ReflectionPlugin;
pub use water::WaterPlugin;
