//! Multi-project workspaces
//!
//! Projects run sequentially. A task can ask the workspace to build a task of
//! another project and hand back one of its path slots, which is how a theme
//! inherits from a sibling theme project.

use crate::engine::graph::BuildReport;
use crate::engine::project::Project;
use crate::error::{BuildError, ConfigError, ConfigResult, ExecutionError, ExecutionResult, Result};
use std::cell::{Ref, RefCell};
use std::path::PathBuf;
use tracing::info;

/// Access to the other projects of a build
pub trait SiblingProjects {
    /// Build `task` of `project` and return the value of its `output_slot`
    fn build_sibling(&self, project: &str, task: &str, output_slot: &str)
        -> ExecutionResult<PathBuf>;
}

/// Used when a project is built on its own
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSiblings;

impl SiblingProjects for NoSiblings {
    fn build_sibling(&self, project: &str, _task: &str, _output_slot: &str) -> ExecutionResult<PathBuf> {
        Err(ConfigError::ProjectNotFound(project.to_string()).into())
    }
}

/// An ordered set of projects built together
#[derive(Debug, Default)]
pub struct Workspace {
    projects: Vec<(String, RefCell<Project>)>,
    stack: RefCell<Vec<String>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, project: Project) -> ConfigResult<()> {
        let name = project.name().to_string();
        if self.contains(&name) {
            return Err(ConfigError::DuplicateProject(name));
        }
        self.projects.push((name, RefCell::new(project)));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn project_names(&self) -> Vec<String> {
        self.projects.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Borrow a project by name
    pub fn project(&self, name: &str) -> ConfigResult<Ref<'_, Project>> {
        let cell = self.cell(name)?;
        cell.try_borrow().map_err(|_| self.cycle_error(name))
    }

    /// Evaluate a project and return its execution plan
    pub fn plan(&self, name: &str, targets: &[String]) -> Result<Vec<String>> {
        let mut project = self
            .cell(name)?
            .try_borrow_mut()
            .map_err(|_| self.cycle_error(name))?;
        project.plan(targets)
    }

    /// Run targets of one project
    ///
    /// Re-entering a project that is still running fails with
    /// `CircularDependency`.
    pub fn run(&self, name: &str, targets: &[String]) -> Result<BuildReport> {
        if self.is_running(name) {
            return Err(self.cycle_error(name).into());
        }
        let mut project = self
            .cell(name)?
            .try_borrow_mut()
            .map_err(|_| self.cycle_error(name))?;

        info!(project = %name, targets = ?targets, "building project");
        self.stack.borrow_mut().push(name.to_string());
        let result = project.run_with(targets, self);
        self.stack.borrow_mut().pop();
        result
    }

    /// Run the targets on every project that defines all of them, in order
    pub fn run_all(&self, targets: &[String]) -> Result<Vec<(String, BuildReport)>> {
        let mut reports = Vec::new();
        for name in self.project_names() {
            let defines_all = {
                let project = self.project(&name)?;
                targets.iter().all(|target| project.graph.contains(target))
            };
            if defines_all {
                let report = self.run(&name, targets)?;
                reports.push((name, report));
            }
        }
        Ok(reports)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.projects.iter().position(|(project, _)| project == name)
    }

    fn cell(&self, name: &str) -> ConfigResult<&RefCell<Project>> {
        self.index_of(name)
            .map(|index| &self.projects[index].1)
            .ok_or_else(|| ConfigError::ProjectNotFound(name.to_string()))
    }

    fn is_running(&self, name: &str) -> bool {
        self.stack.borrow().iter().any(|running| running == name)
    }

    fn cycle_error(&self, name: &str) -> ConfigError {
        let mut path = self.stack.borrow().clone();
        path.push(name.to_string());
        ConfigError::CircularDependency(path.join(" -> "))
    }
}

impl SiblingProjects for Workspace {
    fn build_sibling(&self, project: &str, task: &str, output_slot: &str) -> ExecutionResult<PathBuf> {
        if self.is_running(project) {
            return Err(self.cycle_error(project).into());
        }
        self.run(project, &[task.to_string()])
            .map_err(|e| match e {
                BuildError::Config(cycle @ ConfigError::CircularDependency(_))
                | BuildError::TaskFailed {
                    source: ExecutionError::Configuration(cycle @ ConfigError::CircularDependency(_)),
                    ..
                } => cycle.into(),
                other => ExecutionError::Sibling {
                    project: project.to_string(),
                    source: Box::new(other),
                },
            })?;

        let sibling = self.project(project)?;
        let task = sibling
            .graph
            .get(task)
            .ok_or_else(|| ConfigError::TaskNotFound(format!("{}:{}", project, task)))?;
        // relative to the sibling's directory
        Ok(sibling.dir().join(task.slots.path(output_slot)?))
    }
}
