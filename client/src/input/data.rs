use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SceneAction {
    ToggleFps,
    ToggleParameters,
    ToggleInspector,
}
