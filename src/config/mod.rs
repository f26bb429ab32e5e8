//! Project file parsing, validation and loading
//!
//! This module handles discovery and parsing of plugbuild.yml files and
//! turns them into configured projects.

pub mod load;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use load::*;
pub use parse::*;
pub use schema::*;
pub use types::*;
