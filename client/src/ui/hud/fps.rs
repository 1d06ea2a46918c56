use bevy::{
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

#[derive(Component)]
pub struct FpsText;

pub fn fps_text_update_system(
    diagnostics: Res<DiagnosticsStore>,
    mut spans: Query<&mut TextSpan, With<FpsText>>,
) {
    let Some(fps) = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps| fps.smoothed())
    else {
        return;
    };
    for mut span in &mut spans {
        **span = format!("{fps:.0}");
    }
}
