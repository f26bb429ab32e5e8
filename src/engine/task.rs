//! Task definition
//!
//! A task is a struct of slots plus closures: an action, optional `onlyIf`
//! predicates and validators that run before anything in the build executes.

use crate::engine::slot::Slots;
use crate::error::{ConfigResult, ExecutionResult};
use crate::runner::TaskContext;
use std::fmt;

/// The body of a task
pub type Action = Box<dyn Fn(&TaskContext<'_>) -> ExecutionResult<()>>;

/// Predicate deciding whether the action runs; all predicates must hold
pub type OnlyIf = Box<dyn Fn(&TaskContext<'_>) -> bool>;

/// Configuration check run on resolved slots before the build starts
pub type Validator = Box<dyn Fn(&Slots) -> ConfigResult<()>>;

/// Lifecycle state of a task within one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    NotRun,
    Skipped,
    Succeeded,
    Failed,
}

impl TaskState {
    /// Finished without failing; dependents may run
    pub fn is_complete(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Skipped)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::NotRun => "not run",
            TaskState::Skipped => "skipped",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// A named unit of work in the build graph
pub struct Task {
    /// Task name, unique within a project
    pub name: String,

    /// Task type, e.g. `mergeTheme` or `exec`
    pub kind: String,

    /// Description shown by `--list`
    pub description: Option<String>,

    /// Group shown by `--list`
    pub group: Option<String>,

    /// Settings of this task
    pub slots: Slots,

    /// Upstream tasks, in declaration order
    pub depends_on: Vec<String>,

    only_if: Vec<OnlyIf>,
    validators: Vec<Validator>,
    action: Option<Action>,
    state: TaskState,
}

impl Task {
    /// Create a task with no action
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let name = name.into();
        Task {
            slots: Slots::new(name.clone()),
            name,
            kind: kind.into(),
            description: None,
            group: None,
            depends_on: Vec::new(),
            only_if: Vec::new(),
            validators: Vec::new(),
            action: None,
            state: TaskState::NotRun,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> ExecutionResult<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn with_slot(mut self, name: &str) -> Self {
        self.slots.declare(name);
        self
    }

    pub fn with_required_slot(mut self, name: &str) -> Self {
        self.slots.declare_required(name);
        self
    }

    pub fn depends_on(mut self, task: impl Into<String>) -> Self {
        self.add_dependency(task);
        self
    }

    pub fn only_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&TaskContext<'_>) -> bool + 'static,
    {
        self.add_only_if(predicate);
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Slots) -> ConfigResult<()> + 'static,
    {
        self.validators.push(Box::new(validator));
        self
    }

    /// Add an upstream task, ignoring duplicates
    pub fn add_dependency(&mut self, task: impl Into<String>) {
        let task = task.into();
        if !self.depends_on.contains(&task) {
            self.depends_on.push(task);
        }
    }

    pub fn add_only_if<F>(&mut self, predicate: F)
    where
        F: Fn(&TaskContext<'_>) -> bool + 'static,
    {
        self.only_if.push(Box::new(predicate));
    }

    pub fn add_boxed_only_if(&mut self, predicate: OnlyIf) {
        self.only_if.push(predicate);
    }

    pub fn set_action<F>(&mut self, action: F)
    where
        F: Fn(&TaskContext<'_>) -> ExecutionResult<()> + 'static,
    {
        self.action = Some(Box::new(action));
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Required slots and validators
    pub fn check(&self) -> ConfigResult<()> {
        self.slots.check_required()?;
        self.validators.iter().try_for_each(|validate| validate(&self.slots))
    }

    /// Whether every `onlyIf` predicate holds
    pub fn should_run(&self, ctx: &TaskContext<'_>) -> bool {
        self.only_if.iter().all(|predicate| predicate(ctx))
    }

    /// Run the action; a task without one succeeds trivially
    pub fn execute(&self, ctx: &TaskContext<'_>) -> ExecutionResult<()> {
        match &self.action {
            Some(action) => action(ctx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("depends_on", &self.depends_on)
            .field("only_if", &self.only_if.len())
            .field("validators", &self.validators.len())
            .field("state", &self.state)
            .finish()
    }
}
