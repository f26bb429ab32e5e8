//! Command line interface
//!
//! Argument parsing, task listing, dry runs and shell completion.

pub mod app;

pub use app::*;
