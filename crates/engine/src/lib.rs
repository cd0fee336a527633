//! Tabletalk engine library.
//!
//! Turns chat lines from a tabletop session into game actions.
//!
//! ## Structure
//!
//! - `parser/` - Tokenizing, argument model and structural completion
//! - `commands/` - Command definitions (talk, attack, defend, cast, move, heal, roll, ai)
//! - `runner/` - Registry, dispatch pipeline, history and context-aware completion
//! - `infrastructure/` - Ports, system adapters, configuration and snapshot loading
//! - `app` - Application composition

pub mod app;
pub mod commands;
pub mod infrastructure;
pub mod parser;
pub mod runner;

/// End-to-end dispatch tests over the full runner.
#[cfg(test)]
mod e2e_tests;

pub use app::{App, Reply};
