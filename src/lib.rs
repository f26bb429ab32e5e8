//! plugbuild - a build tool for portal plugin projects
//!
//! Projects apply plugins (theme, portlet, hook, layout, service builder)
//! that register extensions and tasks. Tasks declare property slots whose
//! defaults are derived from other slots once configuration is complete, and
//! run in dependency order.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod plugins;
pub mod runner;
pub mod theme;
pub mod utils;

pub use error::{BuildError, Result};

/// Current version of plugbuild
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
