//! Error types for plugbuild

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for plugbuild operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for plugbuild
#[derive(Error, Debug)]
pub enum BuildError {
    /// Configuration-related errors, raised before any task body runs
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while resolving defaults or running task actions
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// A task action failed; the remaining graph was abandoned
    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: ExecutionError,
    },

    /// A planned task already failed in an earlier run of the same graph
    #[error("Task '{0}' failed in an earlier run")]
    AlreadyFailed(String),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing, wiring and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find project file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Unknown plugin '{0}'")]
    UnknownPlugin(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Task type '{0}' is not registered")]
    TaskTypeNotFound(String),

    #[error("Task '{0}' is already defined")]
    DuplicateTask(String),

    #[error("Extension '{0}' is not registered")]
    ExtensionNotFound(String),

    #[error("Extension '{0}' is already registered")]
    DuplicateExtension(String),

    #[error("Project '{0}' is not part of this workspace")]
    ProjectNotFound(String),

    #[error("Project '{0}' is already part of this workspace")]
    DuplicateProject(String),

    #[error("'{owner}' has no property named '{slot}'")]
    UnknownProperty { owner: String, slot: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("No value for required property '{slot}' of '{owner}'")]
    MissingRequiredProperty { owner: String, slot: String },

    #[error("'{first}' and '{second}' cannot both be set")]
    MutuallyExclusiveConfiguration { first: String, second: String },

    #[error("Cannot change property '{slot}' of '{owner}' after evaluation")]
    LateConfiguration { owner: String, slot: String },

    #[error("Failed to read '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Task execution and default resolution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Property '{slot}' of '{owner}' has not been resolved yet")]
    SlotNotReady { owner: String, slot: String },

    #[error("Property '{slot}' of '{owner}' is still waiting for its default")]
    SlotPending { owner: String, slot: String },

    #[error("Invalid value for '{name}': {error}")]
    InvalidPropertyValue { name: String, error: String },

    #[error("Generator reported an error:\n{0}")]
    GeneratorFailed(String),

    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Failed to start '{program}': {error}")]
    Spawn { program: String, error: String },

    #[error("{0}")]
    Configuration(#[from] ConfigError),

    #[error("Project '{project}' could not be built: {source}")]
    Sibling {
        project: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

impl ExecutionError {
    /// Shorthand for an [`ExecutionError::InvalidPropertyValue`]
    pub fn invalid(name: impl Into<String>, error: impl Into<String>) -> Self {
        ExecutionError::InvalidPropertyValue {
            name: name.into(),
            error: error.into(),
        }
    }
}

impl BuildError {
    /// Name of the task that failed, if the error came from a task action
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            BuildError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}
