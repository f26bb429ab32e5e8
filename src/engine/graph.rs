//! Build graph and execution
//!
//! Holds every task of a project in registration order. Running a set of
//! targets computes their dependency closure, orders it with Kahn's algorithm
//! (ties broken by registration order) and executes it fail-fast.

use crate::engine::task::{Task, TaskState};
use crate::error::{BuildError, ConfigError, ConfigResult, Result};
use crate::runner::{ProjectEnv, TaskContext};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, instrument, warn};

/// Outcome of one `run` call
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Tasks handled by this run and the state each one ended in
    pub tasks: Vec<(String, TaskState)>,
}

impl BuildReport {
    pub fn state_of(&self, task: &str) -> Option<TaskState> {
        self.tasks
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, state)| *state)
    }

    pub fn executed(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|(_, state)| *state == TaskState::Succeeded)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|(_, state)| *state == TaskState::Skipped)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// All tasks of a project plus their dependency edges
#[derive(Debug, Default)]
pub struct BuildGraph {
    tasks: Vec<Task>,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task; names are unique per graph
    pub fn register(&mut self, task: Task) -> ConfigResult<&mut Task> {
        if self.contains(&task.name) {
            return Err(ConfigError::DuplicateTask(task.name));
        }
        self.tasks.push(task);
        let index = self.tasks.len() - 1;
        Ok(&mut self.tasks[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.index_of(name).map(|index| &self.tasks[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.index_of(name).map(move |index| &mut self.tasks[index])
    }

    /// Look up a task, failing with `TaskNotFound`
    pub fn task_mut(&mut self, name: &str) -> ConfigResult<&mut Task> {
        self.get_mut(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn tasks_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    /// Every task of the given type, e.g. all `mergeTheme` tasks
    pub fn tasks_of_kind_mut<'a>(&'a mut self, kind: &'a str) -> impl Iterator<Item = &'a mut Task> {
        self.tasks.iter_mut().filter(move |task| task.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Add an edge `task -> dependency`; the dependency may be registered later
    pub fn add_dependency(&mut self, task: &str, dependency: &str) -> ConfigResult<()> {
        self.task_mut(task)?.add_dependency(dependency);
        Ok(())
    }

    /// Every edge resolves and the graph is acyclic
    pub fn validate(&self) -> ConfigResult<()> {
        for task in &self.tasks {
            for dependency in &task.depends_on {
                if !self.contains(dependency) {
                    return Err(ConfigError::TaskNotFound(dependency.clone()));
                }
            }
        }
        if let Some(cycle) = self.find_cycle() {
            return Err(ConfigError::CircularDependency(cycle.join(" -> ")));
        }
        Ok(())
    }

    /// Execution order for the given targets
    #[instrument(skip_all, fields(targets = ?targets))]
    pub fn plan(&self, targets: &[String]) -> ConfigResult<Vec<String>> {
        let mut selected = BTreeSet::new();
        let mut pending: Vec<usize> = Vec::new();
        for target in targets {
            let index = self
                .index_of(target)
                .ok_or_else(|| ConfigError::TaskNotFound(target.clone()))?;
            pending.push(index);
        }
        while let Some(index) = pending.pop() {
            if !selected.insert(index) {
                continue;
            }
            for dependency in &self.tasks[index].depends_on {
                let dep = self
                    .index_of(dependency)
                    .ok_or_else(|| ConfigError::TaskNotFound(dependency.clone()))?;
                pending.push(dep);
            }
        }

        let mut in_degree: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        for &index in &selected {
            let deps = self.dependency_indices(index);
            in_degree.insert(index, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(index);
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| *index)
            .collect();
        let mut order = Vec::with_capacity(selected.len());

        while let Some(index) = ready.pop_first() {
            order.push(self.tasks[index].name.clone());
            for dependent in dependents.get(&index).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if order.len() != selected.len() {
            let cycle = self
                .find_cycle()
                .map(|cycle| cycle.join(" -> "))
                .unwrap_or_else(|| targets.join(", "));
            return Err(ConfigError::CircularDependency(cycle));
        }

        Ok(order)
    }

    /// Run the targets and everything they depend on
    ///
    /// Required slots and validators of every planned task are checked before
    /// any action runs. Tasks that already succeeded or were skipped are left
    /// alone; a planned task that failed earlier stops the run.
    pub fn run(&mut self, targets: &[String], env: &ProjectEnv<'_>) -> Result<BuildReport> {
        let order = self.plan(targets)?;

        for name in &order {
            if let Some(task) = self.get(name) {
                match task.state() {
                    TaskState::NotRun => task.check()?,
                    TaskState::Failed => return Err(BuildError::AlreadyFailed(name.clone())),
                    TaskState::Succeeded | TaskState::Skipped => {}
                }
            }
        }

        let mut report = BuildReport::default();
        for name in &order {
            let Some(index) = self.index_of(name) else {
                continue;
            };
            let task = &self.tasks[index];
            if task.state().is_complete() {
                continue;
            }

            let ctx = TaskContext::new(task, env);
            let outcome = if task.should_run(&ctx) {
                info!(project = %env.name, task = %name, "running task");
                Some(task.execute(&ctx))
            } else {
                warn!(project = %env.name, task = %name, "skipping task, onlyIf condition not met");
                None
            };

            let state = match outcome {
                None => TaskState::Skipped,
                Some(Ok(())) => TaskState::Succeeded,
                Some(Err(source)) => {
                    self.tasks[index].set_state(TaskState::Failed);
                    return Err(BuildError::TaskFailed {
                        task: name.clone(),
                        source,
                    });
                }
            };
            self.tasks[index].set_state(state);
            report.tasks.push((name.clone(), state));
        }

        info!(project = %env.name, tasks = report.tasks.len(), "build finished");
        Ok(report)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.name == name)
    }

    fn dependency_indices(&self, index: usize) -> BTreeSet<usize> {
        self.tasks[index]
            .depends_on
            .iter()
            .filter_map(|dep| self.index_of(dep))
            .collect()
    }

    /// A dependency cycle as a closed path of task names, if there is one
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(
            graph: &BuildGraph,
            index: usize,
            marks: &mut [Mark],
            path: &mut Vec<usize>,
        ) -> Option<Vec<String>> {
            marks[index] = Mark::Active;
            path.push(index);
            for dep in graph.dependency_indices(index) {
                match marks[dep] {
                    Mark::Active => {
                        let start = path.iter().position(|&i| i == dep).unwrap_or(0);
                        let mut cycle: Vec<String> = path[start..]
                            .iter()
                            .map(|&i| graph.tasks[i].name.clone())
                            .collect();
                        cycle.push(graph.tasks[dep].name.clone());
                        return Some(cycle);
                    }
                    Mark::New => {
                        if let Some(cycle) = visit(graph, dep, marks, path) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }
            path.pop();
            marks[index] = Mark::Done;
            None
        }

        let mut marks = vec![Mark::New; self.tasks.len()];
        for index in 0..self.tasks.len() {
            if marks[index] == Mark::New {
                let mut path = Vec::new();
                if let Some(cycle) = visit(self, index, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}
