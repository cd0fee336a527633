//! Read-only entity snapshots handed to the interpreter by its collaborators.

mod character;
mod scene;

pub use character::{CharacterSnapshot, DEFAULT_ARMOR_CLASS};
pub use scene::SceneSnapshot;
