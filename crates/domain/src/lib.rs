//! Tabletalk domain - read-only game snapshots and value objects consumed by
//! the chat command interpreter.

extern crate self as tabletalk_domain;

pub mod context;
pub mod entities;
pub mod error;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use context::{is_self_reference, Environment, ExecutionContext, SELF_REFERENCES};
pub use entities::{CharacterSnapshot, SceneSnapshot, DEFAULT_ARMOR_CLASS};
pub use error::DomainError;
pub use ids::{CharacterId, SceneId, SessionId, UserId};
pub use types::{Permissions, SessionInfo, SessionSettings, WorldRole};
pub use value_objects::{DiceFormula, DiceParseError, DiceRollResult, HitPoints, MAX_MODIFIER};
