//! Two-phase evaluation
//!
//! During configuration, plugins and the project loader register callbacks.
//! `evaluate` runs them once, in registration order, then resolves every
//! deferred default (extensions first, then tasks) and seals all slots.

use crate::engine::extension::Extensions;
use crate::engine::graph::BuildGraph;
use crate::error::{ConfigError, ConfigResult, Result};
use tracing::{debug, instrument};

/// Callback run at the end of the configuration phase
pub type ConfigureCallback = Box<dyn FnOnce(&mut Extensions, &mut BuildGraph) -> ConfigResult<()>>;

/// Current phase of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    Evaluated,
}

/// Runs configuration callbacks and resolves defaults exactly once
pub struct EvaluationScheduler {
    callbacks: Vec<(String, ConfigureCallback)>,
    phase: Phase,
}

impl Default for EvaluationScheduler {
    fn default() -> Self {
        EvaluationScheduler {
            callbacks: Vec::new(),
            phase: Phase::Configuration,
        }
    }
}

impl EvaluationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_evaluated(&self) -> bool {
        self.phase == Phase::Evaluated
    }

    /// Register a callback; `label` only shows up in logs
    pub fn after_evaluate<F>(&mut self, label: impl Into<String>, callback: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Extensions, &mut BuildGraph) -> ConfigResult<()> + 'static,
    {
        let label = label.into();
        if self.is_evaluated() {
            return Err(ConfigError::LateConfiguration {
                owner: "project".to_string(),
                slot: label,
            });
        }
        self.callbacks.push((label, Box::new(callback)));
        Ok(())
    }

    /// Run the evaluation phase; later calls are no-ops
    #[instrument(skip_all)]
    pub fn evaluate(&mut self, extensions: &mut Extensions, graph: &mut BuildGraph) -> Result<()> {
        if self.is_evaluated() {
            return Ok(());
        }

        for (label, callback) in self.callbacks.drain(..) {
            debug!(callback = %label, "running configuration callback");
            callback(extensions, graph)?;
        }
        graph.validate()?;

        extensions.resolve_all()?;
        for task in graph.tasks_mut() {
            task.slots.resolve_all(extensions)?;
        }

        extensions.seal();
        for task in graph.tasks_mut() {
            task.slots.seal();
        }
        self.phase = Phase::Evaluated;
        debug!(
            extensions = extensions.len(),
            tasks = graph.len(),
            "evaluation complete"
        );
        Ok(())
    }
}

impl std::fmt::Debug for EvaluationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationScheduler")
            .field("callbacks", &self.callbacks.len())
            .field("phase", &self.phase)
            .finish()
    }
}
