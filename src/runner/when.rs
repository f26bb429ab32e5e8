//! `only-if` condition evaluation
//!
//! Conditions from the project file become `onlyIf` predicates on tasks. All
//! conditions of a task must hold.

use crate::config;
use crate::error::ExecutionResult;
use crate::runner::{check_command, interpolate, TaskContext};
use std::env;
use tracing::warn;

/// A single condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equal { left: String, right: String },
    NotEqual { left: String, right: String },
    Command(String),
    Exists(String),
    NotExists(String),
    EnvSet(String),
    EnvNotSet(String),
}

impl Condition {
    /// Convert a project file entry; `None` when the entry names no condition
    pub fn from_config(config: &config::When) -> Option<Self> {
        let condition = if let Some(eq) = &config.equal {
            Condition::Equal {
                left: eq.left.clone(),
                right: eq.right.clone(),
            }
        } else if let Some(ne) = &config.not_equal {
            Condition::NotEqual {
                left: ne.left.clone(),
                right: ne.right.clone(),
            }
        } else if let Some(cmd) = &config.command {
            Condition::Command(cmd.clone())
        } else if let Some(path) = &config.exists {
            Condition::Exists(path.clone())
        } else if let Some(path) = &config.not_exists {
            Condition::NotExists(path.clone())
        } else if let Some(var) = &config.env_set {
            Condition::EnvSet(var.clone())
        } else if let Some(var) = &config.env_not_set {
            Condition::EnvNotSet(var.clone())
        } else {
            return None;
        };
        Some(condition)
    }
}

/// Evaluate a list of conditions (all must be true - AND logic)
pub fn evaluate_all(conditions: &[Condition], ctx: &TaskContext<'_>) -> ExecutionResult<bool> {
    for condition in conditions {
        if !evaluate(condition, ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluate a single condition
pub fn evaluate(condition: &Condition, ctx: &TaskContext<'_>) -> ExecutionResult<bool> {
    let vars = ctx.vars();
    let expand = |s: &String| interpolate(s, &vars).unwrap_or_else(|_| s.clone());

    match condition {
        Condition::Equal { left, right } => Ok(expand(left) == expand(right)),

        Condition::NotEqual { left, right } => Ok(expand(left) != expand(right)),

        Condition::Command(cmd) => check_command(cmd, &vars, ctx.project_dir(), ctx.interpreter()),

        Condition::Exists(path) => Ok(ctx.project_dir().join(expand(path)).exists()),

        Condition::NotExists(path) => Ok(!ctx.project_dir().join(expand(path)).exists()),

        Condition::EnvSet(var) => Ok(env::var(expand(var)).is_ok()),

        Condition::EnvNotSet(var) => Ok(env::var(expand(var)).is_err()),
    }
}

/// Wrap conditions as an `onlyIf` predicate
///
/// A condition that cannot be evaluated counts as false.
pub fn conditions_predicate(
    conditions: Vec<Condition>,
) -> impl Fn(&TaskContext<'_>) -> bool + 'static {
    move |ctx| match evaluate_all(&conditions, ctx) {
        Ok(holds) => holds,
        Err(e) => {
            warn!(task = %ctx.name(), error = %e, "could not evaluate only-if condition");
            false
        }
    }
}
