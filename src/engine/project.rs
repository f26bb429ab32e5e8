//! A single buildable project
//!
//! Owns the extensions, the build graph and the evaluation scheduler, and
//! records which plugins have been applied.

use crate::engine::extension::{Extension, Extensions};
use crate::engine::graph::{BuildGraph, BuildReport};
use crate::engine::scheduler::EvaluationScheduler;
use crate::engine::task::Task;
use crate::engine::workspace::{NoSiblings, SiblingProjects};
use crate::error::{ConfigError, ConfigResult, Result};
use crate::plugins::Plugin;
use crate::runner::ProjectEnv;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds a fresh task of a registered type
pub type TaskFactory = fn(&str) -> Task;

pub struct Project {
    name: String,
    dir: PathBuf,
    pub extensions: Extensions,
    pub graph: BuildGraph,
    scheduler: EvaluationScheduler,
    plugins: Vec<&'static str>,
    task_types: HashMap<String, TaskFactory>,
    interpreter: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Project {
            name: name.into(),
            dir: dir.into(),
            extensions: Extensions::new(),
            graph: BuildGraph::new(),
            scheduler: EvaluationScheduler::new(),
            plugins: Vec::new(),
            task_types: HashMap::new(),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
        }
    }

    /// Use a custom shell for `exec` tasks and `command` conditions
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        if !interpreter.is_empty() {
            self.interpreter = interpreter;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn interpreter(&self) -> &[String] {
        &self.interpreter
    }

    pub fn plugins(&self) -> &[&'static str] {
        &self.plugins
    }

    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.contains(&id)
    }

    pub fn is_evaluated(&self) -> bool {
        self.scheduler.is_evaluated()
    }

    /// Apply a plugin; applying the same plugin twice is a no-op
    pub fn apply(&mut self, plugin: &dyn Plugin) -> ConfigResult<()> {
        if self.has_plugin(plugin.id()) {
            return Ok(());
        }
        debug!(project = %self.name, plugin = plugin.id(), "applying plugin");
        self.plugins.push(plugin.id());
        plugin.apply(self)
    }

    /// Register an extension unless one with that name already exists
    pub fn ensure_extension(&mut self, name: &str) -> ConfigResult<&mut Extension> {
        if !self.extensions.contains(name) {
            self.extensions.register(Extension::new(name))?;
        }
        self.extensions
            .get_mut(name)
            .ok_or_else(|| ConfigError::ExtensionNotFound(name.to_string()))
    }

    pub fn register_task_type(&mut self, kind: impl Into<String>, factory: TaskFactory) {
        self.task_types.insert(kind.into(), factory);
    }

    pub fn has_task_type(&self, kind: &str) -> bool {
        self.task_types.contains_key(kind)
    }

    /// Create and register a task of a registered type
    pub fn create_task(&mut self, name: &str, kind: &str) -> ConfigResult<&mut Task> {
        let factory = self
            .task_types
            .get(kind)
            .ok_or_else(|| ConfigError::TaskTypeNotFound(kind.to_string()))?;
        let task = factory(name);
        self.graph.register(task)
    }

    /// Register a callback for the end of the configuration phase
    pub fn after_evaluate<F>(&mut self, label: impl Into<String>, callback: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Extensions, &mut BuildGraph) -> ConfigResult<()> + 'static,
    {
        self.scheduler.after_evaluate(label, callback)
    }

    /// Run the evaluation phase if it has not run yet
    pub fn evaluate(&mut self) -> Result<()> {
        self.scheduler.evaluate(&mut self.extensions, &mut self.graph)
    }

    /// Evaluate and return the execution order for the targets
    pub fn plan(&mut self, targets: &[String]) -> Result<Vec<String>> {
        self.evaluate()?;
        Ok(self.graph.plan(targets)?)
    }

    /// Evaluate and run the targets without access to other projects
    pub fn run(&mut self, targets: &[String]) -> Result<BuildReport> {
        self.run_with(targets, &NoSiblings)
    }

    /// Evaluate and run the targets; sibling lookups go through `siblings`
    pub fn run_with(
        &mut self,
        targets: &[String],
        siblings: &dyn SiblingProjects,
    ) -> Result<BuildReport> {
        self.evaluate()?;
        let env = ProjectEnv::new(&self.name, &self.dir, &self.extensions, siblings)
            .with_interpreter(&self.interpreter);
        self.graph.run(targets, &env)
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .field("plugins", &self.plugins)
            .field("tasks", &self.graph.len())
            .finish()
    }
}
