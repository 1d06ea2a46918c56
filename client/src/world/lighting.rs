use bevy::prelude::*;
use shared::{hex_to_srgb_u8, AMBIENT_LIGHT_COLOR, DIRECTIONAL_LIGHT_POSITION};

use crate::constants::AMBIENT_BRIGHTNESS;

pub fn spawn_lights(mut commands: Commands) {
    commands.spawn((
        Name::new("Directional light"),
        DirectionalLight::default(),
        Transform::from_translation(DIRECTIONAL_LIGHT_POSITION).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let [r, g, b] = hex_to_srgb_u8(AMBIENT_LIGHT_COLOR);
    commands.insert_resource(AmbientLight {
        color: Color::srgb_u8(r, g, b),
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });
}
