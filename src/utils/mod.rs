//! Filesystem helpers

pub mod fileset;

pub use fileset::{copy_file, copy_fileset, FileSet};
