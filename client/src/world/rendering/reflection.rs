//! Planar reflection of the scene in the water.
//!
//! A second camera renders the scene mirrored through the water plane into an
//! offscreen image before the main pass. The water samples that image through
//! the mirror camera's projection. The image keeps the main view's aspect
//! ratio so both cameras share one field of view.

use bevy::{
    core_pipeline::tonemapping::Tonemapping,
    prelude::*,
    render::{
        camera::{CameraUpdateSystem, RenderTarget},
        render_asset::RenderAssetUsages,
        render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
        view::RenderLayers,
    },
    transform::TransformSystem,
};
use bevy_atmosphere::prelude::AtmosphereCamera;
use shared::{camera::mirror_view, config::SceneConfig};

use super::water_material::{WaterMaterial, WaterMaterialResource};
use crate::{
    camera::{perspective, MainCamera},
    constants::{REFLECTION_SKY_LAYER, SCENE_LAYER, WATER_LEVEL},
};

pub struct ReflectionPlugin;

impl Plugin for ReflectionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_reflection)
            .add_systems(
                PostUpdate,
                (
                    follow_main_camera.before(TransformSystem::TransformPropagate),
                    fit_reflection_to_view.after(CameraUpdateSystem),
                    upload_mirror_projection
                        .after(TransformSystem::TransformPropagate)
                        .after(CameraUpdateSystem),
                ),
            );
    }
}

#[derive(Resource)]
pub struct ReflectionTarget {
    pub image: Handle<Image>,
}

#[derive(Component)]
pub struct ReflectionCamera;

/// Target size for a view of `aspect`: `resolution` rows, as many columns as
/// the aspect asks for.
pub fn reflection_extent(resolution: u32, aspect: f32) -> Extent3d {
    let height = resolution.max(1);
    let width = if aspect.is_finite() && aspect > 0.0 {
        ((height as f32 * aspect).round() as u32).max(1)
    } else {
        height
    };
    Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn reflection_image(resolution: u32) -> Image {
    let mut image = Image::new_fill(
        reflection_extent(resolution, 1.0),
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Bgra8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image
}

pub fn setup_reflection(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    config: Res<SceneConfig>,
) {
    let image = images.add(reflection_image(config.reflection_resolution));

    commands.spawn((
        Name::new("Reflection camera"),
        ReflectionCamera,
        Camera3d::default(),
        Camera {
            target: RenderTarget::Image(image.clone().into()),
            order: -1,
            ..default()
        },
        perspective(),
        Tonemapping::None,
        AtmosphereCamera {
            render_layers: Some(RenderLayers::layer(REFLECTION_SKY_LAYER)),
        },
        RenderLayers::from_layers(&[SCENE_LAYER, REFLECTION_SKY_LAYER]),
        Transform::default(),
    ));

    commands.insert_resource(ReflectionTarget { image });
    info!(
        "Reflection target created at {}x{}",
        config.reflection_resolution, config.reflection_resolution
    );
}

/// Places the mirror camera below the water, opposite the main camera.
pub fn follow_main_camera(
    main: Query<&Transform, (With<MainCamera>, Without<ReflectionCamera>)>,
    mut mirrors: Query<&mut Transform, With<ReflectionCamera>>,
) {
    let Ok(main_transform) = main.single() else {
        return;
    };
    let eye = main_transform.translation;
    let target = eye + main_transform.forward().as_vec3();
    let (mirrored_eye, mirrored_target, up) = mirror_view(eye, target, WATER_LEVEL);

    for mut transform in &mut mirrors {
        *transform = Transform::from_translation(mirrored_eye).looking_at(mirrored_target, up);
    }
}

/// Resizes the mirror target whenever the main view's aspect changes, so the
/// mirror camera derives the same projection as the main one.
pub fn fit_reflection_to_view(
    main: Query<&Projection, With<MainCamera>>,
    target: Option<Res<ReflectionTarget>>,
    config: Res<SceneConfig>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(target) = target else {
        return;
    };
    let Ok(Projection::Perspective(main_projection)) = main.single() else {
        return;
    };
    let extent = reflection_extent(config.reflection_resolution, main_projection.aspect_ratio);
    let Some(current) = images.get(&target.image) else {
        return;
    };
    if current.texture_descriptor.size == extent {
        return;
    }
    if let Some(image) = images.get_mut(&target.image) {
        image.resize(extent);
        debug!("Reflection target resized to {}x{}", extent.width, extent.height);
    }
}

pub fn upload_mirror_projection(
    mirrors: Query<(&Camera, &GlobalTransform), With<ReflectionCamera>>,
    water: Option<Res<WaterMaterialResource>>,
    mut materials: ResMut<Assets<WaterMaterial>>,
) {
    let Some(water) = water else {
        return;
    };
    let Ok((camera, transform)) = mirrors.single() else {
        return;
    };
    let Some(material) = materials.get_mut(&water.handle) else {
        return;
    };
    material.uniform.mirror_clip_from_world =
        camera.clip_from_view() * transform.compute_matrix().inverse();
}
