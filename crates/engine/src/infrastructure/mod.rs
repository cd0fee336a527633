//! Infrastructure implementations.
//!
//! Port implementations, configuration and snapshot loading.

pub mod clock;
pub mod config;
pub mod context_loader;
pub mod ports;
