//! External generator invocation
//!
//! Generators (service builder, thumbnail builder, CSS builder) are Java
//! entry points taking `key=value` arguments. The exit code tells nothing
//! useful, so success is decided from the captured output: any output
//! containing [`ERROR_MARKER`] is a failure.

use crate::error::{ExecutionError, ExecutionResult};
use crate::utils::copy_file;
use std::path::{Component, Path, PathBuf};
use std::process::Command as StdCommand;
use tracing::{debug, info};

/// Substring that marks generator output as a failure
pub const ERROR_MARKER: &str = "Error";

/// Classification of a finished generator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Success,
    GeneratorFailed(String),
}

/// Classify captured output; absent output counts as success
pub fn classify_output(output: Option<&str>) -> ToolOutcome {
    match output {
        Some(text) if text.contains(ERROR_MARKER) => ToolOutcome::GeneratorFailed(text.to_string()),
        _ => ToolOutcome::Success,
    }
}

/// A file copied under the working directory before launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedInput {
    pub source: PathBuf,
    /// Location relative to the working directory
    pub target: PathBuf,
}

/// Everything needed to launch one generator run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub entry_point: String,
    pub working_dir: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub args: Vec<String>,
    pub jvm_args: Vec<String>,
    pub staged: Vec<StagedInput>,
}

impl Invocation {
    pub fn new(entry_point: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Invocation {
            entry_point: entry_point.into(),
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    /// Append a positional `key=value` argument
    pub fn arg(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.args.push(format!("{}={}", key, value));
        self
    }

    /// Append a `-Dkey=value` JVM argument
    pub fn system_property(mut self, key: &str, value: impl std::fmt::Display) -> Self {
        self.jvm_args.push(format!("-D{}={}", key, value));
        self
    }

    /// Copy `source` to `target` (relative to the working directory) before launch
    pub fn stage(mut self, source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.staged.push(StagedInput {
            source: source.into(),
            target: target.into(),
        });
        self
    }
}

/// Starts a generator process and returns its combined output
pub trait ProcessLauncher {
    fn launch(&self, invocation: &Invocation) -> ExecutionResult<Option<String>>;
}

impl<F> ProcessLauncher for F
where
    F: Fn(&Invocation) -> ExecutionResult<Option<String>>,
{
    fn launch(&self, invocation: &Invocation) -> ExecutionResult<Option<String>> {
        self(invocation)
    }
}

/// Runs `java [jvm args] -cp <classpath> <entry point> <args>`
#[derive(Debug, Clone)]
pub struct JavaLauncher {
    java: PathBuf,
}

impl JavaLauncher {
    pub fn new(java: impl Into<PathBuf>) -> Self {
        JavaLauncher { java: java.into() }
    }
}

impl ProcessLauncher for JavaLauncher {
    fn launch(&self, invocation: &Invocation) -> ExecutionResult<Option<String>> {
        let classpath = std::env::join_paths(&invocation.classpath)
            .map_err(|e| ExecutionError::invalid("classpath", e.to_string()))?;

        let mut cmd = StdCommand::new(&self.java);
        cmd.args(&invocation.jvm_args);
        cmd.arg("-cp").arg(classpath);
        cmd.arg(&invocation.entry_point);
        cmd.args(&invocation.args);
        cmd.current_dir(&invocation.working_dir);

        let output = cmd.output().map_err(|e| ExecutionError::Spawn {
            program: self.java.display().to_string(),
            error: e.to_string(),
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        if combined.is_empty() {
            Ok(None)
        } else {
            Ok(Some(combined))
        }
    }
}

/// Stages inputs, launches the generator and classifies its output
pub struct ExternalToolInvoker<L> {
    launcher: L,
}

impl<L: ProcessLauncher> ExternalToolInvoker<L> {
    pub fn new(launcher: L) -> Self {
        ExternalToolInvoker { launcher }
    }

    /// Run the generator and report how it went
    pub fn invoke(&self, invocation: &Invocation) -> ExecutionResult<ToolOutcome> {
        std::fs::create_dir_all(&invocation.working_dir)?;
        for input in &invocation.staged {
            let target = staged_target(&invocation.working_dir, &input.target)?;
            debug!(from = %input.source.display(), to = %target.display(), "staging input");
            copy_file(&input.source, &target)?;
        }

        info!(entry_point = %invocation.entry_point, dir = %invocation.working_dir.display(), "invoking generator");
        debug!(args = ?invocation.args, jvm_args = ?invocation.jvm_args, "generator arguments");

        let output = self.launcher.launch(invocation)?;
        if let Some(text) = &output {
            for line in text.lines() {
                info!(target: "plugbuild::generator", "{}", line);
            }
        }

        Ok(classify_output(output.as_deref()))
    }

    /// Like [`ExternalToolInvoker::invoke`], failing with `GeneratorFailed`
    pub fn run(&self, invocation: &Invocation) -> ExecutionResult<()> {
        match self.invoke(invocation)? {
            ToolOutcome::Success => Ok(()),
            ToolOutcome::GeneratorFailed(output) => Err(ExecutionError::GeneratorFailed(output)),
        }
    }
}

fn staged_target(working_dir: &Path, target: &Path) -> ExecutionResult<PathBuf> {
    let escapes = target
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ExecutionError::invalid(
            "stagedInput",
            format!("'{}' must be relative to the working directory", target.display()),
        ));
    }
    Ok(working_dir.join(target))
}
