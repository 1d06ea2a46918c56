//! Loading and placement of the harbour models.
//!
//! Every catalog entry is requested at startup and polled each frame until it
//! either loads, in which case its default scene is spawned with the catalog
//! placement, or fails, in which case the failure is logged and the rest of
//! the scene carries on. Texture overrides wait for both the spawned scene
//! and the texture; a texture that fails leaves the model's own materials.

use bevy::{
    asset::LoadState,
    gltf::Gltf,
    prelude::*,
    scene::SceneInstanceReady,
};
use shared::{
    models::{LoadOutcome, ModelLoadLedger, SceneAsset, SCENE_ASSETS},
    sets::SceneUpdateSet,
};

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, start_model_loads::<Gltf>)
            .add_systems(
                Update,
                (poll_model_loads::<Gltf>, apply_texture_overrides)
                    .chain()
                    .in_set(SceneUpdateSet::Assets),
            );
    }
}

/// Asset a catalog model is loaded as, and the scene spawned from it.
pub trait ModelAsset: Asset {
    fn scene(&self) -> Option<Handle<Scene>>;
}

impl ModelAsset for Gltf {
    fn scene(&self) -> Option<Handle<Scene>> {
        self.default_scene
            .clone()
            .or_else(|| self.scenes.first().cloned())
    }
}

#[derive(Resource)]
pub struct ModelLoads<M: ModelAsset> {
    models: Vec<Handle<M>>,
    textures: Vec<Option<Handle<Image>>>,
    pub ledger: ModelLoadLedger,
}

/// Index of the catalog entry a spawned scene came from.
#[derive(Component, Debug)]
pub struct PlacedModel(pub usize);

/// Base colour texture forced onto every mesh of a model once both the scene
/// and the texture are ready. Removed once resolved either way.
#[derive(Component)]
pub struct TextureOverride(pub Handle<Image>);

/// Set on a model root once its scene instance has spawned.
#[derive(Component)]
pub struct SceneReady;

pub fn start_model_loads<M: ModelAsset>(mut commands: Commands, asset_server: Res<AssetServer>) {
    let models = SCENE_ASSETS
        .iter()
        .map(|asset| {
            info!("Loading model {} from {}", asset.name, asset.path);
            asset_server.load::<M>(asset.path)
        })
        .collect();
    let textures = SCENE_ASSETS
        .iter()
        .map(|asset| asset.texture.map(|path| asset_server.load::<Image>(path)))
        .collect();

    commands.insert_resource(ModelLoads {
        models,
        textures,
        ledger: ModelLoadLedger::new(SCENE_ASSETS.len()),
    });
}

pub fn poll_model_loads<M: ModelAsset>(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    assets: Res<Assets<M>>,
    loads: Option<ResMut<ModelLoads<M>>>,
) {
    let Some(mut loads) = loads else {
        return;
    };
    if loads.ledger.is_settled() {
        return;
    }

    let ModelLoads {
        models,
        textures,
        ledger,
    } = &mut *loads;
    let pending: Vec<usize> = ledger.pending().collect();

    for index in pending {
        let asset = &SCENE_ASSETS[index];
        let handle = &models[index];
        match asset_server.get_load_state(handle) {
            Some(LoadState::Loaded) => match assets.get(handle).and_then(ModelAsset::scene) {
                Some(scene) => {
                    if ledger.resolve(index, LoadOutcome::Loaded) {
                        attach_model(&mut commands, index, asset, scene, textures[index].clone());
                    }
                }
                None => {
                    error!(
                        "An error happened during the model {} loading: the file has no scene",
                        asset.name
                    );
                    ledger.resolve(index, LoadOutcome::Failed);
                }
            },
            Some(LoadState::Failed(err)) => {
                error!(
                    "An error happened during the model {} loading: {}",
                    asset.name, err
                );
                ledger.resolve(index, LoadOutcome::Failed);
            }
            _ => {}
        }
    }

    if ledger.is_settled() {
        info!(
            "Model loading settled: {} attached, {} failed",
            ledger.count(shared::models::LoadStatus::Attached),
            ledger.count(shared::models::LoadStatus::Failed)
        );
    }
}

fn attach_model(
    commands: &mut Commands,
    index: usize,
    asset: &SceneAsset,
    scene: Handle<Scene>,
    texture: Option<Handle<Image>>,
) {
    let mut entity = commands.spawn((
        Name::new(asset.name),
        PlacedModel(index),
        SceneRoot(scene),
        Transform {
            translation: asset.translation,
            rotation: asset.rotation_quat(),
            scale: asset.scale_vec(),
        },
    ));
    if let Some(texture) = texture {
        entity
            .insert(TextureOverride(texture))
            .observe(mark_scene_ready);
    }
    info!("Model {} attached", asset.name);
}

fn mark_scene_ready(trigger: Trigger<SceneInstanceReady>, mut commands: Commands) {
    commands.entity(trigger.target()).insert(SceneReady);
}

/// Retextures spawned models whose override texture has loaded. A texture
/// that failed is logged once and the model keeps its own materials.
pub fn apply_texture_overrides(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    roots: Query<(Entity, &Name, &TextureOverride), With<SceneReady>>,
    children: Query<&Children>,
    mesh_materials: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (root, name, TextureOverride(texture)) in &roots {
        if let Some(LoadState::Failed(err)) = asset_server.get_load_state(texture) {
            error!(
                "An error happened during the texture loading for model {}: {}",
                name, err
            );
            commands.entity(root).remove::<TextureOverride>();
            continue;
        }
        if !images.contains(texture) {
            continue;
        }

        for descendant in children.iter_descendants(root) {
            let Ok(MeshMaterial3d(material)) = mesh_materials.get(descendant) else {
                continue;
            };
            let Some(mut retextured) = materials.get(material).cloned() else {
                continue;
            };
            retextured.base_color_texture = Some(texture.clone());
            commands
                .entity(descendant)
                .insert(MeshMaterial3d(materials.add(retextured)));
        }
        commands.entity(root).remove::<TextureOverride>();
        debug!("Texture override applied to model {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::{
        io::{
            memory::{Dir, MemoryAssetReader},
            AssetSource, AssetSourceId, Reader,
        },
        AssetLoader, LoadContext,
    };
    use shared::models::LoadStatus;
    use std::{path::Path, time::Duration};

    /// Stand-in for a glTF file: one empty scene.
    #[derive(Asset, TypePath)]
    struct TestModel {
        scene: Handle<Scene>,
    }

    impl ModelAsset for TestModel {
        fn scene(&self) -> Option<Handle<Scene>> {
            Some(self.scene.clone())
        }
    }

    /// Loads any `.glb` as a [`TestModel`], except the rock which is corrupt.
    #[derive(Default)]
    struct TestModelLoader;

    impl AssetLoader for TestModelLoader {
        type Asset = TestModel;
        type Settings = ();
        type Error = std::io::Error;

        async fn load(
            &self,
            _reader: &mut dyn Reader,
            _settings: &(),
            load_context: &mut LoadContext<'_>,
        ) -> Result<TestModel, Self::Error> {
            if load_context.path().ends_with("rock.glb") {
                return Err(std::io::Error::other("corrupt model"));
            }
            let scene =
                load_context.add_labeled_asset("Scene0".to_string(), Scene::new(World::new()));
            Ok(TestModel { scene })
        }

        fn extensions(&self) -> &[&str] {
            &["glb"]
        }
    }

    fn settle<M: ModelAsset>(app: &mut App) {
        for _ in 0..500 {
            app.update();
            if app.world().resource::<ModelLoads<M>>().ledger.is_settled() {
                return;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    fn placed(app: &mut App) -> Vec<(usize, Transform)> {
        let mut query = app.world_mut().query::<(&PlacedModel, &Transform)>();
        let mut placed: Vec<(usize, Transform)> = query
            .iter(app.world())
            .map(|(model, transform)| (model.0, *transform))
            .collect();
        placed.sort_by_key(|(index, _)| *index);
        placed
    }

    #[test]
    fn test_unloadable_models_settle_without_attaching() {
        let mut app = App::new();
        // No glTF loader is registered, so every request fails.
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Gltf>()
            .init_asset::<Image>()
            .init_asset::<Scene>()
            .add_systems(Startup, start_model_loads::<Gltf>)
            .add_systems(Update, poll_model_loads::<Gltf>);

        settle::<Gltf>(&mut app);

        let ledger = &app.world().resource::<ModelLoads<Gltf>>().ledger;
        assert!(ledger.is_settled());
        assert_eq!(ledger.count(LoadStatus::Failed), SCENE_ASSETS.len());
        assert!(placed(&mut app).is_empty());
    }

    #[test]
    fn test_failed_loads_do_not_block_the_others_from_attaching() {
        // The coast file is missing and the rock is corrupt.
        let dir = Dir::default();
        for file in ["ship", "pier", "low_boat", "men", "rock"] {
            dir.insert_asset(Path::new(&format!("models/{file}.glb")), vec![0u8]);
        }

        let mut app = App::new();
        app.register_asset_source(
            AssetSourceId::Default,
            AssetSource::build().with_reader(move || {
                Box::new(MemoryAssetReader { root: dir.clone() })
            }),
        )
        .add_plugins((MinimalPlugins, AssetPlugin::default()))
        .init_asset::<TestModel>()
        .init_asset::<Image>()
        .init_asset::<Scene>()
        .init_asset_loader::<TestModelLoader>()
        .add_systems(Startup, start_model_loads::<TestModel>)
        .add_systems(Update, poll_model_loads::<TestModel>);

        settle::<TestModel>(&mut app);

        let ledger = &app.world().resource::<ModelLoads<TestModel>>().ledger;
        assert!(ledger.is_settled());
        assert_eq!(ledger.count(LoadStatus::Attached), 5);
        assert_eq!(ledger.count(LoadStatus::Failed), 2);

        let attached = placed(&mut app);
        let indices: Vec<usize> = attached.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![0, 2, 3, 4, 5]);
        for (index, transform) in &attached {
            let asset = &SCENE_ASSETS[*index];
            assert_eq!(transform.translation, asset.translation);
            assert_eq!(transform.rotation, asset.rotation_quat());
            assert_eq!(transform.scale, asset.scale_vec());
        }

        for _ in 0..5 {
            app.update();
        }
        assert_eq!(placed(&mut app).len(), 5);
    }

    fn override_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .init_asset::<StandardMaterial>()
            .add_systems(Update, apply_texture_overrides);
        app
    }

    /// Spawns a model root with one textured-to-be mesh child.
    fn spawn_model(
        app: &mut App,
        texture: Handle<Image>,
    ) -> (Entity, Entity, Handle<StandardMaterial>) {
        let material = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        let root = app
            .world_mut()
            .spawn((Name::new("low boat"), TextureOverride(texture)))
            .id();
        let mesh = app
            .world_mut()
            .spawn((MeshMaterial3d(material.clone()), ChildOf(root)))
            .id();
        (root, mesh, material)
    }

    fn material_of(app: &App, mesh: Entity) -> Handle<StandardMaterial> {
        app.world()
            .get::<MeshMaterial3d<StandardMaterial>>(mesh)
            .unwrap()
            .0
            .clone()
    }

    #[test]
    fn test_texture_override_waits_for_the_scene_then_retextures() {
        let mut app = override_app();
        let texture = app
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .add(Image::default());
        let (root, mesh, original) = spawn_model(&mut app, texture.clone());

        app.update();
        assert_eq!(material_of(&app, mesh), original);

        app.world_mut().entity_mut(root).insert(SceneReady);
        app.update();

        let retextured = material_of(&app, mesh);
        assert_ne!(retextured, original);
        let materials = app.world().resource::<Assets<StandardMaterial>>();
        assert_eq!(materials.get(&retextured).unwrap().base_color_texture, Some(texture));
        assert_eq!(materials.get(&original).unwrap().base_color_texture, None);
        assert!(app.world().get::<TextureOverride>(root).is_none());
    }

    #[test]
    fn test_failed_texture_keeps_the_model_materials() {
        let mut app = override_app();
        // No image loader is registered, so this load fails.
        let texture = app
            .world()
            .resource::<AssetServer>()
            .load::<Image>("textures/wood.jpg");
        let (root, mesh, original) = spawn_model(&mut app, texture);
        app.world_mut().entity_mut(root).insert(SceneReady);

        for _ in 0..500 {
            app.update();
            if app.world().get::<TextureOverride>(root).is_none() {
                break;
            }
            std::thread::sleep(Duration::from_millis(2));
        }

        assert!(app.world().get::<TextureOverride>(root).is_none());
        assert_eq!(material_of(&app, mesh), original);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 1);
    }
}
