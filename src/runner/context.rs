//! Execution context for task actions
//!
//! The context gives an action read-only access to its own resolved slots,
//! the project extensions and the other projects of the workspace.

use crate::engine::extension::Extensions;
use crate::engine::slot::Slots;
use crate::engine::task::Task;
use crate::engine::workspace::SiblingProjects;
use crate::error::ExecutionResult;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Project-level state shared by every task of one run
pub struct ProjectEnv<'a> {
    /// Project name
    pub name: &'a str,

    /// Project directory; relative paths resolve against it
    pub dir: &'a Path,

    /// Resolved extensions
    pub extensions: &'a Extensions,

    /// Other projects of the workspace
    pub siblings: &'a dyn SiblingProjects,

    /// Shell used for commands (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,
}

impl<'a> ProjectEnv<'a> {
    pub fn new(
        name: &'a str,
        dir: &'a Path,
        extensions: &'a Extensions,
        siblings: &'a dyn SiblingProjects,
    ) -> Self {
        ProjectEnv {
            name,
            dir,
            extensions,
            siblings,
            interpreter: vec!["sh".to_string(), "-c".to_string()],
        }
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: &[String]) -> Self {
        if !interpreter.is_empty() {
            self.interpreter = interpreter.to_vec();
        }
        self
    }

    /// Resolve a path against the project directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

/// What a task action or `onlyIf` predicate sees
pub struct TaskContext<'a> {
    pub task: &'a Task,
    pub env: &'a ProjectEnv<'a>,
}

impl<'a> TaskContext<'a> {
    pub fn new(task: &'a Task, env: &'a ProjectEnv<'a>) -> Self {
        TaskContext { task, env }
    }

    pub fn name(&self) -> &str {
        &self.task.name
    }

    pub fn slots(&self) -> &'a Slots {
        &self.task.slots
    }

    pub fn project_dir(&self) -> &Path {
        self.env.dir
    }

    pub fn siblings(&self) -> &'a dyn SiblingProjects {
        self.env.siblings
    }

    pub fn interpreter(&self) -> &[String] {
        &self.env.interpreter
    }

    /// Slots of a project extension
    pub fn ext(&self, name: &str) -> ExecutionResult<&'a Slots> {
        Ok(self.env.extensions.slots(name)?)
    }

    /// A path slot, resolved against the project directory
    pub fn file(&self, name: &str) -> ExecutionResult<PathBuf> {
        Ok(self.env.resolve(&self.task.slots.path(name)?))
    }

    /// Like [`TaskContext::file`], `None` when the slot stayed unset
    pub fn opt_file(&self, name: &str) -> ExecutionResult<Option<PathBuf>> {
        Ok(self
            .task
            .slots
            .opt_path(name)?
            .map(|path| self.env.resolve(&path)))
    }

    /// Path list slot, each entry resolved against the project directory
    pub fn files(&self, name: &str) -> ExecutionResult<Vec<PathBuf>> {
        Ok(self
            .task
            .slots
            .paths(name)?
            .iter()
            .map(|path| self.env.resolve(path))
            .collect())
    }

    pub fn string(&self, name: &str) -> ExecutionResult<String> {
        self.task.slots.string(name)
    }

    pub fn opt_string(&self, name: &str) -> ExecutionResult<Option<String>> {
        self.task.slots.opt_string(name)
    }

    pub fn int(&self, name: &str) -> ExecutionResult<i64> {
        self.task.slots.int(name)
    }

    pub fn boolean(&self, name: &str) -> ExecutionResult<bool> {
        self.task.slots.boolean(name)
    }

    /// Variables available for `${...}` interpolation
    ///
    /// Holds `project.name`, `project.dir`, every resolved slot of the task
    /// under its own name and every extension slot as `extension.slot`.
    pub fn vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("project.name".to_string(), self.env.name.to_string());
        vars.insert("project.dir".to_string(), self.env.dir.display().to_string());
        for ext in self.env.extensions.iter() {
            for slot in ext.slots().iter() {
                if let Some(value) = slot.value() {
                    vars.insert(format!("{}.{}", ext.name(), slot.name()), value.to_string());
                }
            }
        }
        for slot in self.task.slots.iter() {
            if let Some(value) = slot.value() {
                vars.insert(slot.name().to_string(), value.to_string());
            }
        }
        vars
    }
}
