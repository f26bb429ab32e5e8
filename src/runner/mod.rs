//! Task execution support
//!
//! Everything a task action needs at run time: its context, shell commands,
//! `${...}` interpolation, configured conditions and generator invocation.

pub mod command;
pub mod context;
pub mod interpolate;
pub mod invoker;
pub mod when;

pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use invoker::*;
pub use when::*;
