use bevy::{prelude::*, window::PrimaryWindow};
use bevy_inspector_egui::{bevy_egui::EguiContext, bevy_inspector};

use super::PanelVisibility;

/// Full world inspector, hidden until toggled.
pub fn inspector_ui(world: &mut World) {
    if !world
        .get_resource::<PanelVisibility>()
        .is_some_and(|panels| panels.inspector)
    {
        return;
    }

    let Ok(egui_context) = world
        .query_filtered::<&mut EguiContext, With<PrimaryWindow>>()
        .single(world)
    else {
        return;
    };
    let mut egui_context = egui_context.clone();

    egui::Window::new("Inspector")
        .default_open(true)
        .default_pos([12.0, 120.0])
        .show(egui_context.get_mut(), |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                bevy_inspector::ui_for_world(world, ui);
            });
        });
}
