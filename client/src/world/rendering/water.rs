//! The ocean surface.

use bevy::{
    image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor},
    pbr::NotShadowCaster,
    prelude::*,
    render::view::RenderLayers,
};
use shared::{
    environment::{EnvironmentParameters, SunMoved},
    sets::SceneUpdateSet,
    water::WaterParameters,
    WATER_NORMALS_PATH, WORLD_EXTENT,
};

use super::{
    reflection::{setup_reflection, ReflectionTarget},
    water_material::{WaterMaterial, WaterMaterialResource, WaterMaterialUniform},
};
use crate::constants::{WATER_LAYER, WATER_LEVEL};

pub struct WaterPlugin;

impl Plugin for WaterPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<WaterMaterial>::default())
            .add_systems(Startup, setup_water.after(setup_reflection))
            .add_systems(
                Update,
                (
                    advance_water_time,
                    (apply_sun_to_water, sync_water_material),
                )
                    .chain()
                    .in_set(SceneUpdateSet::Environment),
            );
    }
}

#[derive(Component)]
pub struct WaterSurface;

fn setup_water(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<WaterMaterial>>,
    reflection: Res<ReflectionTarget>,
    water: Res<WaterParameters>,
    environment: Res<EnvironmentParameters>,
) {
    // The normal map tiles across the whole plane.
    let normals = asset_server.load_with_settings(
        WATER_NORMALS_PATH,
        |settings: &mut ImageLoaderSettings| {
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                address_mode_u: ImageAddressMode::Repeat,
                address_mode_v: ImageAddressMode::Repeat,
                ..ImageSamplerDescriptor::linear()
            });
        },
    );

    let handle = materials.add(WaterMaterial {
        uniform: WaterMaterialUniform::new(&water, environment.sun_direction()),
        normals,
        reflection: reflection.image.clone(),
    });

    commands.spawn((
        Name::new("Water"),
        WaterSurface,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(WORLD_EXTENT, WORLD_EXTENT))),
        MeshMaterial3d(handle.clone()),
        Transform::from_xyz(0.0, WATER_LEVEL, 0.0),
        NotShadowCaster,
        RenderLayers::layer(WATER_LAYER),
    ));
    commands.insert_resource(WaterMaterialResource { handle });
    info!("Water surface spawned");
}

/// Fixed step per frame, independent of the frame duration.
pub fn advance_water_time(mut water: ResMut<WaterParameters>) {
    water.advance();
}

pub fn apply_sun_to_water(
    mut sun_moved: EventReader<SunMoved>,
    environment: Res<EnvironmentParameters>,
    water: Option<Res<WaterMaterialResource>>,
    mut materials: ResMut<Assets<WaterMaterial>>,
) {
    if sun_moved.read().count() == 0 {
        return;
    }
    let Some(material) = water.and_then(|water| materials.get_mut(&water.handle)) else {
        return;
    };
    material.uniform.sun_direction = environment.sun_direction();
}

pub fn sync_water_material(
    water: Res<WaterParameters>,
    material: Option<Res<WaterMaterialResource>>,
    mut materials: ResMut<Assets<WaterMaterial>>,
) {
    let Some(material) = material.and_then(|material| materials.get_mut(&material.handle)) else {
        return;
    };
    material.uniform.apply(&water);
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::water::WATER_TIME_STEP;

    #[test]
    fn test_water_clock_advances_once_per_frame() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<WaterParameters>()
            .add_systems(Update, advance_water_time);

        for _ in 0..60 {
            app.update();
        }
        let time = app.world().resource::<WaterParameters>().time;
        assert!((time - 60.0 * WATER_TIME_STEP).abs() < 1e-5);
    }

    #[test]
    fn test_material_follows_sun_and_clock() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<WaterMaterial>()
            .add_event::<SunMoved>()
            .init_resource::<WaterParameters>()
            .init_resource::<EnvironmentParameters>()
            .add_systems(
                Update,
                (advance_water_time, (apply_sun_to_water, sync_water_material)).chain(),
            );

        let handle = app
            .world_mut()
            .resource_mut::<Assets<WaterMaterial>>()
            .add(WaterMaterial {
                uniform: WaterMaterialUniform::new(&WaterParameters::default(), Vec3::Z),
                normals: Handle::default(),
                reflection: Handle::default(),
            });
        app.insert_resource(WaterMaterialResource {
            handle: handle.clone(),
        });

        app.world_mut()
            .resource_mut::<EnvironmentParameters>()
            .set_elevation(45.0);
        app.world_mut().send_event(SunMoved);
        app.update();

        let expected_sun = app.world().resource::<EnvironmentParameters>().sun_direction();
        let materials = app.world().resource::<Assets<WaterMaterial>>();
        let material = materials.get(&handle).unwrap();
        assert!((material.uniform.sun_direction - expected_sun).length() < 1e-6);
        assert!((material.uniform.time - WATER_TIME_STEP).abs() < 1e-6);
    }
}
