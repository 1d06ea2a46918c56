//! Static models placed around the harbour.
//!
//! Each catalog entry is loaded independently. The ledger records how every
//! load resolved so the scene can attach each model exactly once, whatever
//! order the loads finish in and whether or not the others failed.

use std::f32::consts::{FRAC_PI_2, PI};

use bevy::math::{EulerRot, Quat, Vec3};

/// Placement of one model in the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneAsset {
    pub name: &'static str,
    pub path: &'static str,
    pub translation: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: f32,
    /// Texture replacing the base colour of every mesh in the model.
    pub texture: Option<&'static str>,
}

impl SceneAsset {
    const fn new(name: &'static str, path: &'static str, translation: Vec3) -> Self {
        Self {
            name,
            path,
            translation,
            rotation: Vec3::ZERO,
            scale: 1.0,
            texture: None,
        }
    }

    const fn rotated(mut self, x: f32, y: f32) -> Self {
        self.rotation = Vec3::new(x, y, 0.0);
        self
    }

    const fn scaled(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    const fn textured(mut self, texture: &'static str) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn scale_vec(&self) -> Vec3 {
        Vec3::splat(self.scale)
    }
}

pub const SHIP_PATH: &str = "models/ship.glb";

pub const SCENE_ASSETS: [SceneAsset; 7] = [
    SceneAsset::new("ship", SHIP_PATH, Vec3::new(0.0, 0.0, -400.0))
        .rotated(0.0, FRAC_PI_2)
        .scaled(10.0),
    SceneAsset::new("coast", "models/coast.glb", Vec3::new(700.0, 0.0, -550.0)).scaled(20.0),
    SceneAsset::new("pier", "models/pier.glb", Vec3::new(400.0, 0.0, -500.0))
        .rotated(0.0, PI - 0.7)
        .scaled(10.0),
    SceneAsset::new("low boat", "models/low_boat.glb", Vec3::ZERO)
        .rotated(0.03, PI)
        .textured("textures/wood.jpg"),
    SceneAsset::new("men", "models/men.glb", Vec3::new(6.0, 0.0, -3.0))
        .rotated(0.0, PI)
        .scaled(3.0),
    SceneAsset::new("ship 2", SHIP_PATH, Vec3::new(-400.0, 0.0, -600.0))
        .rotated(0.0, FRAC_PI_2 + 5.0)
        .scaled(10.0),
    SceneAsset::new("rock", "models/rock.glb", Vec3::new(-50.0, 0.0, -50.0))
        .scaled(10.0)
        .textured("textures/rock.jpg"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Attached,
    Failed,
}

/// How a single load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
}

/// Load bookkeeping for a list of assets, indexed like the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLoadLedger {
    statuses: Vec<LoadStatus>,
}

impl ModelLoadLedger {
    pub fn new(count: usize) -> Self {
        Self {
            statuses: vec![LoadStatus::Pending; count],
        }
    }

    /// Records the outcome of load `index`. Returns `true` only when the
    /// caller should attach the asset now: the first successful resolution of
    /// a pending entry. Resolved entries are never revisited.
    pub fn resolve(&mut self, index: usize, outcome: LoadOutcome) -> bool {
        let Some(status) = self.statuses.get_mut(index) else {
            return false;
        };
        if *status != LoadStatus::Pending {
            return false;
        }
        match outcome {
            LoadOutcome::Loaded => {
                *status = LoadStatus::Attached;
                true
            }
            LoadOutcome::Failed => {
                *status = LoadStatus::Failed;
                false
            }
        }
    }

    pub fn status(&self, index: usize) -> Option<LoadStatus> {
        self.statuses.get(index).copied()
    }

    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.statuses
            .iter()
            .enumerate()
            .filter(|(_, status)| **status == LoadStatus::Pending)
            .map(|(index, _)| index)
    }

    pub fn count(&self, status: LoadStatus) -> usize {
        self.statuses.iter().filter(|s| **s == status).count()
    }

    pub fn is_settled(&self) -> bool {
        self.count(LoadStatus::Pending) == 0
    }
}
