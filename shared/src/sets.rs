use bevy::prelude::*;

/// Ordering of the per-frame scene work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneUpdateSet {
    /// Pointer and keyboard handling, parameter panel.
    Input,
    /// Parameter-driven state: sun, bake, fog, water uniforms.
    Environment,
    /// Asset load polling and attachment.
    Assets,
    Ui,
}
