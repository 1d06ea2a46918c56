use crate::{input::data::SceneAction, KeyMap};
use bevy::prelude::*;
use ron::{from_str, ser::PrettyConfig};
use shared::{SceneFolderPaths, BINDS_FILE_NAME};
use std::path::Path;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

fn write_keybindings_to_path(key_map: &KeyMap, binds_path: &Path) -> Result<(), std::io::Error> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(true)
        .with_enumerate_arrays(true);

    let serialized =
        ron::ser::to_string_pretty(key_map, pretty_config).map_err(std::io::Error::other)?;
    if let Some(parent) = binds_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(binds_path)?;
    file.write_all(serialized.as_bytes())
}

pub fn is_action_just_pressed(
    action: SceneAction,
    keyboard_input: &ButtonInput<KeyCode>,
    key_map: &KeyMap,
) -> bool {
    key_map
        .map
        .get(&action)
        .is_some_and(|key_codes| keyboard_input.any_just_pressed(key_codes.iter().copied()))
}

pub fn get_action_keys(action: SceneAction, key_map: &KeyMap) -> Vec<KeyCode> {
    key_map.map.get(&action).cloned().unwrap_or_default()
}

pub(crate) fn default_key_map() -> BTreeMap<SceneAction, Vec<KeyCode>> {
    let mut map = BTreeMap::new();
    map.insert(SceneAction::ToggleParameters, vec![KeyCode::F1]);
    map.insert(SceneAction::ToggleFps, vec![KeyCode::F3]);
    map.insert(SceneAction::ToggleInspector, vec![KeyCode::F12]);
    map
}

fn read_bindings(binds_path: &Path) -> Option<KeyMap> {
    let content = fs::read_to_string(binds_path).ok()?;
    match from_str::<KeyMap>(&content) {
        Ok(key_map) => Some(key_map),
        Err(e) => {
            warn!("Ignoring malformed keybindings at {:?}: {}", binds_path, e);
            None
        }
    }
}

pub fn get_bindings(folder_paths: &SceneFolderPaths) -> KeyMap {
    let binds_path: PathBuf = folder_paths.assets_folder_path.join(BINDS_FILE_NAME);

    if let Some(key_map) = read_bindings(&binds_path) {
        return key_map;
    }

    let key_map = KeyMap::default();
    if let Err(e) = write_keybindings_to_path(&key_map, binds_path.as_path()) {
        error!(
            "Failed to create default keybindings file at {:?}: {}",
            binds_path, e
        );
    }
    key_map
}
