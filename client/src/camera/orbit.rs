use bevy::{
    input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit},
    prelude::*,
    window::PrimaryWindow,
};
use bevy_inspector_egui::bevy_egui::EguiContexts;

use super::{MainCamera, OrbitController};
use crate::constants::PIXELS_PER_LINE;

/// Left drag orbits, right drag pans, the wheel zooms.
pub fn orbit_camera_system(
    mut cameras: Query<(&mut OrbitController, &mut Transform, &Projection), With<MainCamera>>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
) {
    // The parameter panel owns the pointer while hovered.
    if contexts
        .try_ctx_mut()
        .is_some_and(|ctx| ctx.wants_pointer_input() || ctx.is_pointer_over_area())
    {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((mut controller, mut transform, projection)) = cameras.single_mut() else {
        return;
    };

    let viewport_height = window.height();
    let OrbitController { state, settings } = &mut *controller;
    let mut changed = false;

    if motion.delta != Vec2::ZERO {
        if mouse_buttons.pressed(MouseButton::Left) {
            state.rotate(motion.delta, viewport_height, settings);
            changed = true;
        } else if mouse_buttons.pressed(MouseButton::Right) {
            let fov = match projection {
                Projection::Perspective(perspective) => perspective.fov,
                _ => shared::CAMERA_FOV_DEGREES.to_radians(),
            };
            state.pan(motion.delta, viewport_height, fov, settings);
            changed = true;
        }
    }

    if scroll.delta.y != 0.0 {
        let steps = match scroll.unit {
            MouseScrollUnit::Line => scroll.delta.y,
            MouseScrollUnit::Pixel => scroll.delta.y / PIXELS_PER_LINE,
        };
        state.zoom(steps, settings);
        changed = true;
    }

    if changed {
        *transform = Transform::from_translation(state.eye()).looking_at(state.target, Vec3::Y);
    }
}
