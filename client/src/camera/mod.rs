pub mod orbit;

use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    pbr::{DistanceFog, FogFalloff},
    prelude::*,
    render::view::{ColorGrading, ColorGradingGlobal, RenderLayers},
    window::WindowResized,
};
use bevy_atmosphere::prelude::AtmosphereCamera;
use shared::{
    camera::{aspect_ratio, OrbitSettings, OrbitState},
    config::SceneConfig,
    fog::{FogParameters, FOG_COLOR},
    hex_to_srgb_u8,
    sets::SceneUpdateSet,
    CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, CAMERA_START,
};

use crate::constants::{MAIN_SKY_LAYER, SCENE_LAYER, WATER_LAYER};

#[derive(Component)]
pub struct MainCamera;

#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub state: OrbitState,
    pub settings: OrbitSettings,
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera).add_systems(
            Update,
            (orbit::orbit_camera_system, sync_camera_aspect).in_set(SceneUpdateSet::Input),
        );
    }
}

pub fn perspective() -> Projection {
    Projection::Perspective(PerspectiveProjection {
        fov: CAMERA_FOV_DEGREES.to_radians(),
        near: CAMERA_NEAR,
        far: CAMERA_FAR,
        ..default()
    })
}

pub fn distance_fog(fog: &FogParameters) -> DistanceFog {
    let [r, g, b] = hex_to_srgb_u8(FOG_COLOR);
    DistanceFog {
        color: Color::srgb_u8(r, g, b),
        falloff: FogFalloff::ExponentialSquared {
            density: fog.density,
        },
        ..default()
    }
}

fn spawn_camera(mut commands: Commands, config: Res<SceneConfig>, fog: Res<FogParameters>) {
    let settings = config.orbit;
    let mut state = OrbitState::from_eye(CAMERA_START, settings.target);
    state.clamp(&settings);

    commands.spawn((
        Name::new("Main camera"),
        MainCamera,
        Camera3d::default(),
        Camera {
            hdr: true,
            ..default()
        },
        perspective(),
        Tonemapping::AcesFitted,
        ColorGrading {
            global: ColorGradingGlobal {
                exposure: config.exposure_ev(),
                ..default()
            },
            ..default()
        },
        Transform::from_translation(state.eye()).looking_at(state.target, Vec3::Y),
        distance_fog(&fog),
        AtmosphereCamera {
            render_layers: Some(RenderLayers::layer(MAIN_SKY_LAYER)),
        },
        RenderLayers::from_layers(&[SCENE_LAYER, WATER_LAYER, MAIN_SKY_LAYER]),
        OrbitController { state, settings },
    ));

    info!("Main camera spawned at {:?}", state.eye());
}

/// Keeps the projection aspect in step with the window.
pub fn sync_camera_aspect(
    mut resized: EventReader<WindowResized>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    let Some(aspect) = resized
        .read()
        .filter_map(|event| aspect_ratio(event.width, event.height))
        .last()
    else {
        return;
    };

    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = aspect;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resize_app() -> (App, Entity) {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<WindowResized>()
            .add_systems(Update, sync_camera_aspect);
        let camera = app.world_mut().spawn((MainCamera, perspective())).id();
        (app, camera)
    }

    fn aspect_of(app: &App, camera: Entity) -> f32 {
        match app.world().get::<Projection>(camera) {
            Some(Projection::Perspective(p)) => p.aspect_ratio,
            _ => panic!("camera lost its perspective projection"),
        }
    }

    #[test]
    fn test_resize_updates_aspect() {
        let (mut app, camera) = resize_app();
        app.world_mut().send_event(WindowResized {
            window: Entity::PLACEHOLDER,
            width: 1280.0,
            height: 720.0,
        });
        app.update();
        assert!((aspect_of(&app, camera) - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_resize_is_ignored() {
        let (mut app, camera) = resize_app();
        app.world_mut().send_event(WindowResized {
            window: Entity::PLACEHOLDER,
            width: 800.0,
            height: 400.0,
        });
        app.update();
        app.world_mut().send_event(WindowResized {
            window: Entity::PLACEHOLDER,
            width: 800.0,
            height: 0.0,
        });
        app.update();
        assert!((aspect_of(&app, camera) - 2.0).abs() < 1e-6);
    }
}
