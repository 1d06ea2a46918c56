//! Sun, sky dome, baked environment lighting and fog.
//!
//! A [`SunMoved`] event is the only thing that moves the sun. Each consumer
//! reads it independently: the sky dome follows right away, the water picks
//! up the new highlight direction and the environment lighting is baked
//! again from the same sky model. The bake runs on the async compute pool;
//! a newer sun drops the bake in flight, so a slider drag costs one bake
//! once it settles rather than one per frame.

use bevy::{
    pbr::{environment_map::EnvironmentMapLight, DistanceFog, FogFalloff},
    prelude::*,
    render::{
        render_asset::RenderAssetUsages,
        render_resource::{
            Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
            TextureViewDescriptor, TextureViewDimension,
        },
    },
    tasks::{block_on, futures_lite::future, AsyncComputeTaskPool, Task},
};
use bevy_atmosphere::prelude::*;
use shared::{
    bake::{bake_environment, BakeSlot, EnvironmentBake, PackedCube, FACE_COUNT},
    config::SceneConfig,
    environment::{EnvironmentParameters, SunMoved},
    fog::FogParameters,
    sets::SceneUpdateSet,
    sky::{SkyModel, SkyParameters},
};

use crate::camera::MainCamera;

pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SunMoved>()
            .init_resource::<EnvironmentBakeSlot>()
            .add_systems(Startup, (setup_sky, announce_initial_sun))
            .add_systems(
                Update,
                (apply_sun_to_sky, rebake_environment, sync_fog).in_set(SceneUpdateSet::Environment),
            );
    }
}

/// Image pair bound to the main camera as environment lighting.
#[derive(Debug, Clone)]
pub struct BakedEnvironment {
    pub diffuse: Handle<Image>,
    pub specular: Handle<Image>,
}

#[derive(Resource, Default)]
pub struct EnvironmentBakeSlot(pub BakeSlot<BakedEnvironment>);

/// Bake currently running on the async compute pool, if any.
#[derive(Default)]
pub struct PendingBake {
    task: Option<Task<(Vec3, EnvironmentBake)>>,
}

/// Sky dome parameters for a sun along `sun_direction`.
pub fn nishita(sky: &SkyParameters, sun_direction: Vec3) -> Nishita {
    let model = SkyModel::new(sky, sun_direction);
    Nishita {
        ray_origin: model.ray_origin,
        sun_position: model.sun_direction,
        sun_intensity: model.sun_intensity,
        planet_radius: model.planet_radius,
        atmosphere_radius: model.atmosphere_radius,
        rayleigh_coefficient: model.rayleigh_coefficient,
        rayleigh_scale_height: model.rayleigh_scale_height,
        mie_coefficient: model.mie_coefficient,
        mie_scale_height: model.mie_scale_height,
        mie_direction: model.mie_direction,
    }
}

fn setup_sky(mut commands: Commands, sky: Res<SkyParameters>, environment: Res<EnvironmentParameters>) {
    commands.insert_resource(AtmosphereModel::new(nishita(&sky, environment.sun_direction())));
}

/// The scene starts with one sun update so every consumer sees the initial sun.
fn announce_initial_sun(mut sun_moved: EventWriter<SunMoved>) {
    sun_moved.write(SunMoved);
}

pub fn apply_sun_to_sky(
    mut sun_moved: EventReader<SunMoved>,
    environment: Res<EnvironmentParameters>,
    sky: Res<SkyParameters>,
    mut atmosphere: AtmosphereMut<Nishita>,
) {
    if sun_moved.read().count() == 0 {
        return;
    }
    *atmosphere = nishita(&sky, environment.sun_direction());
}

fn cube_image(cube: &PackedCube) -> Image {
    Image {
        data: Some(cube.to_bytes()),
        texture_descriptor: TextureDescriptor {
            label: None,
            size: Extent3d {
                width: cube.size,
                height: cube.size,
                depth_or_array_layers: FACE_COUNT as u32,
            },
            mip_level_count: cube.mip_level_count,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgb9e5Ufloat,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        },
        texture_view_descriptor: Some(TextureViewDescriptor {
            dimension: Some(TextureViewDimension::Cube),
            ..default()
        }),
        asset_usage: RenderAssetUsages::RENDER_WORLD,
        ..default()
    }
}

/// Starts a bake on every sun change and installs it once finished, freeing
/// the previous pair first.
pub fn rebake_environment(
    mut commands: Commands,
    mut sun_moved: EventReader<SunMoved>,
    mut pending: Local<PendingBake>,
    environment: Res<EnvironmentParameters>,
    sky: Res<SkyParameters>,
    config: Res<SceneConfig>,
    mut images: ResMut<Assets<Image>>,
    mut slot: ResMut<EnvironmentBakeSlot>,
    cameras: Query<Entity, With<MainCamera>>,
) {
    if sun_moved.read().count() > 0 {
        let sun_direction = environment.sun_direction();
        let model = SkyModel::new(&sky, sun_direction);
        let resolution = config.bake_resolution;
        let pool = AsyncComputeTaskPool::get();
        // Dropping the previous task cancels it.
        pending.task = Some(pool.spawn(async move {
            (sun_direction, bake_environment(&model, resolution))
        }));
        return;
    }

    let Some(task) = pending.task.as_mut() else {
        return;
    };
    let Some((sun_direction, bake)) = block_on(future::poll_once(task)) else {
        return;
    };
    pending.task = None;

    if let Some(previous) = slot.0.retire() {
        images.remove(&previous.diffuse);
        images.remove(&previous.specular);
    }

    let baked = BakedEnvironment {
        diffuse: images.add(cube_image(&bake.diffuse)),
        specular: images.add(cube_image(&bake.specular)),
    };

    for camera in &cameras {
        commands.entity(camera).insert(EnvironmentMapLight {
            diffuse_map: baked.diffuse.clone(),
            specular_map: baked.specular.clone(),
            intensity: config.environment_intensity,
            ..default()
        });
    }

    slot.0.install(baked);
    debug!(
        "Environment baked (generation {}) for sun {:?}",
        slot.0.generation(),
        sun_direction
    );
}

pub fn sync_fog(fog: Res<FogParameters>, mut fogs: Query<&mut DistanceFog, With<MainCamera>>) {
    if !fog.is_changed() {
        return;
    }
    for mut distance_fog in &mut fogs {
        distance_fog.falloff = FogFalloff::ExponentialSquared {
            density: fog.density,
        };
    }
}
