//! Build engine
//!
//! Projects own extensions and a task graph. Configuration happens in two
//! phases: plugins and the project file set values and register deferred
//! defaults, then the scheduler resolves every default once, checks the
//! graph and seals the configuration before any task runs.

pub mod extension;
pub mod graph;
pub mod project;
pub mod scheduler;
pub mod slot;
pub mod task;
pub mod workspace;

pub use extension::{Extension, Extensions};
pub use graph::{BuildGraph, BuildReport};
pub use project::{Project, TaskFactory};
pub use scheduler::{EvaluationScheduler, Phase};
pub use slot::{deferred, DeferredDefault, Origin, PropertySlot, ResolveView, Slots, Value};
pub use task::{Task, TaskState};
pub use workspace::{NoSiblings, SiblingProjects, Workspace};
