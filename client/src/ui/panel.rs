//! Parameter panel.
//!
//! Three folders: Sky moves the sun, Water tunes the shader, Fog sets the
//! density. Sun sliders announce a change only when the value actually moved,
//! so dragging back and forth over the same value bakes nothing.

use bevy::prelude::*;
use bevy_inspector_egui::bevy_egui::EguiContexts;
use shared::{
    environment::{
        EnvironmentParameters, SunMoved, AZIMUTH_RANGE, ELEVATION_RANGE, SUN_SLIDER_STEP,
    },
    fog::{FogParameters, FOG_DENSITY_RANGE, FOG_DENSITY_STEP},
    water::{
        WaterParameters, DISTORTION_SCALE_RANGE, WATER_SIZE_RANGE, WATER_SLIDER_STEP,
        WATER_TIME_RANGE,
    },
};

use super::PanelVisibility;
use crate::{
    input::{data::SceneAction, keyboard::get_action_keys},
    KeyMap,
};

fn slider<'a>(
    value: &'a mut f32,
    range: std::ops::RangeInclusive<f32>,
    step: f64,
    label: &str,
) -> egui::Slider<'a> {
    // Only user edits are clamped: the water clock keeps running past its range.
    egui::Slider::new(value, range)
        .clamping(egui::SliderClamping::Edits)
        .step_by(step)
        .text(label)
}

/// The edited value, if the slider reported a change.
fn edit_value(
    ui: &mut egui::Ui,
    current: f32,
    range: std::ops::RangeInclusive<f32>,
    step: f64,
    label: &str,
) -> Option<f32> {
    let mut edited = current;
    ui.add(slider(&mut edited, range, step, label))
        .changed()
        .then_some(edited)
}

pub fn parameters_panel(
    mut contexts: EguiContexts,
    panels: Res<PanelVisibility>,
    key_map: Res<KeyMap>,
    mut environment: ResMut<EnvironmentParameters>,
    mut water: ResMut<WaterParameters>,
    mut fog: ResMut<FogParameters>,
    mut sun_moved: EventWriter<SunMoved>,
) {
    if !panels.parameters {
        return;
    }
    let Some(ctx) = contexts.try_ctx_mut() else {
        return;
    };

    egui::Window::new("Parameters")
        .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            egui::CollapsingHeader::new("Sky")
                .default_open(true)
                .show(ui, |ui| {
                    let mut moved = false;
                    if let Some(elevation) = edit_value(
                        ui,
                        environment.elevation,
                        ELEVATION_RANGE,
                        SUN_SLIDER_STEP,
                        "elevation",
                    ) {
                        moved |= environment.set_elevation(elevation);
                    }
                    if let Some(azimuth) = edit_value(
                        ui,
                        environment.azimuth,
                        AZIMUTH_RANGE,
                        SUN_SLIDER_STEP,
                        "azimuth",
                    ) {
                        moved |= environment.set_azimuth(azimuth);
                    }
                    if moved {
                        sun_moved.write(SunMoved);
                    }
                });

            egui::CollapsingHeader::new("Water")
                .default_open(true)
                .show(ui, |ui| {
                    if let Some(value) = edit_value(
                        ui,
                        water.distortion_scale,
                        DISTORTION_SCALE_RANGE,
                        WATER_SLIDER_STEP,
                        "distortionScale",
                    ) {
                        water.distortion_scale = value;
                    }
                    if let Some(value) =
                        edit_value(ui, water.time, WATER_TIME_RANGE, WATER_SLIDER_STEP, "time")
                    {
                        water.time = value;
                    }
                    if let Some(value) =
                        edit_value(ui, water.size, WATER_SIZE_RANGE, WATER_SLIDER_STEP, "size")
                    {
                        water.size = value;
                    }
                });

            egui::CollapsingHeader::new("Fog")
                .default_open(true)
                .show(ui, |ui| {
                    if let Some(density) = edit_value(
                        ui,
                        fog.density,
                        FOG_DENSITY_RANGE,
                        FOG_DENSITY_STEP,
                        "density",
                    ) {
                        fog.density = density;
                    }
                });

            if let Some(key) = get_action_keys(SceneAction::ToggleParameters, &key_map).first() {
                ui.small(format!("{key:?} hides this panel"));
            }
        });
}
