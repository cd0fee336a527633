//! Session vocabulary types shared by the engine and its collaborators.

mod permissions;
mod session;
mod settings;

pub use permissions::Permissions;
pub use session::{SessionInfo, WorldRole};
pub use settings::SessionSettings;
