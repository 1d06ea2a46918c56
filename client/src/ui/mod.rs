pub mod hud;
pub mod inspector;
pub mod panel;

use bevy::prelude::*;
use shared::sets::SceneUpdateSet;

use crate::{
    input::{data::SceneAction, keyboard::is_action_just_pressed},
    ui::{
        hud::{fps_text_update_system, setup_hud, toggle_hud_system},
        inspector::inspector_ui,
        panel::parameters_panel,
    },
    KeyMap,
};

/// Which egui windows are open.
#[derive(Resource, Debug)]
pub struct PanelVisibility {
    pub parameters: bool,
    pub inspector: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            parameters: true,
            inspector: false,
        }
    }
}

pub fn toggle_panels_system(
    keyboard: Res<ButtonInput<KeyCode>>,
    key_map: Res<KeyMap>,
    mut panels: ResMut<PanelVisibility>,
) {
    if is_action_just_pressed(SceneAction::ToggleParameters, &keyboard, &key_map) {
        panels.parameters = !panels.parameters;
    }
    if is_action_just_pressed(SceneAction::ToggleInspector, &keyboard, &key_map) {
        panels.inspector = !panels.inspector;
    }
}

pub struct SceneUiPlugin;

impl Plugin for SceneUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelVisibility>()
            .add_systems(Startup, setup_hud)
            .add_systems(
                Update,
                (toggle_panels_system, parameters_panel)
                    .chain()
                    .in_set(SceneUpdateSet::Input),
            )
            .add_systems(
                Update,
                (fps_text_update_system, toggle_hud_system, inspector_ui)
                    .in_set(SceneUpdateSet::Ui),
            );
    }
}
