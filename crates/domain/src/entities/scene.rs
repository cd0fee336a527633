use serde::{Deserialize, Serialize};

use crate::ids::SceneId;

/// The scene currently on stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub id: SceneId,
    pub name: String,
    /// Places reachable from this scene, used for movement hints
    #[serde(default)]
    pub known_locations: Vec<String>,
}

impl SceneSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            known_locations: Vec::new(),
        }
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive lookup of a known location, returning its canonical spelling.
    pub fn find_location(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.known_locations
            .iter()
            .find(|loc| loc.to_lowercase() == wanted)
            .map(String::as_str)
    }
}
