pub mod fps;

use bevy::prelude::*;

use crate::input::{data::SceneAction, keyboard::is_action_just_pressed};
use crate::KeyMap;
pub use fps::*;

/// Container of the frame-rate counter, toggled as a whole.
#[derive(Component)]
pub struct HudRoot;

pub fn setup_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            BackgroundColor(Color::BLACK.with_alpha(0.5)),
            GlobalZIndex(i32::MAX),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(1.),
                top: Val::Percent(1.),
                padding: UiRect::all(Val::Px(4.0)),
                ..default()
            },
        ))
        .with_children(|root| {
            root.spawn((
                Text::new("FPS: "),
                TextFont::from_font_size(16.0),
                TextColor(Color::WHITE),
            ))
            .with_child((
                FpsText,
                TextSpan::new("N/A"),
                TextFont::from_font_size(16.0),
                TextColor(Color::WHITE),
            ));
        });
}

pub fn toggle_hud_system(
    mut roots: Query<&mut Visibility, With<HudRoot>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    key_map: Res<KeyMap>,
) {
    if !is_action_just_pressed(SceneAction::ToggleFps, &keyboard, &key_map) {
        return;
    }
    for mut visibility in &mut roots {
        *visibility = match *visibility {
            Visibility::Hidden => Visibility::Visible,
            _ => Visibility::Hidden,
        };
    }
}
