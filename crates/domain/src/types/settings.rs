use serde::{Deserialize, Serialize};

/// Table rules that shape how commands validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Only resolve targets that are participants of the current scene
    pub restrict_targets_to_scene: bool,
    /// Attach a warning when someone acts outside their turn
    pub warn_out_of_turn: bool,
    /// Whether the table allows handing characters to the AI at all
    pub allow_ai_control: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            restrict_targets_to_scene: false,
            warn_out_of_turn: true,
            allow_ai_control: true,
        }
    }
}
