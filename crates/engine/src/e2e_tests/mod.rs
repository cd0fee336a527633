//! End-to-end dispatch tests.
//!
//! These drive a complete [`CommandRunner`](crate::runner::CommandRunner)
//! from raw chat lines, with fixed clock and dice ports:
//! - Parser and dispatcher properties
//! - Multi-command table flows through [`App`](crate::App)
//!
//! ```bash
//! cargo test -p tabletalk-engine --lib e2e_tests
//! ```

mod dispatch_properties;
mod e2e_helpers;

pub use e2e_helpers::*;
