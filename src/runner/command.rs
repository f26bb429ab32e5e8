//! Shell command execution
//!
//! Used by `exec` tasks, the `war` packaging command and `command`
//! conditions.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::interpolate;
use std::collections::HashMap;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use tracing::info;

/// Run a command through the interpreter, inheriting stdio
///
/// `${...}` references are interpolated from `vars` first; a non-zero exit
/// status fails with `CommandFailed`.
pub fn run_shell(
    command: &str,
    vars: &HashMap<String, String>,
    working_dir: &Path,
    interpreter: &[String],
) -> ExecutionResult<()> {
    let exec_str = interpolate(command, vars)?;
    info!(command = %exec_str, dir = %working_dir.display(), "running command");

    let mut cmd = shell(interpreter, &exec_str)?;
    cmd.current_dir(working_dir);
    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::inherit());
    cmd.stderr(Stdio::inherit());

    let status = cmd.status().map_err(|e| ExecutionError::Spawn {
        program: interpreter.first().cloned().unwrap_or_default(),
        error: e.to_string(),
    })?;

    if !status.success() {
        return Err(ExecutionError::CommandFailed(status.code()));
    }

    Ok(())
}

/// Check if a command succeeds (for `command` conditions)
pub fn check_command(
    command: &str,
    vars: &HashMap<String, String>,
    working_dir: &Path,
    interpreter: &[String],
) -> ExecutionResult<bool> {
    let exec_str = interpolate(command, vars)?;

    let mut cmd = shell(interpreter, &exec_str)?;
    cmd.current_dir(working_dir);
    cmd.stdout(Stdio::null());
    cmd.stderr(Stdio::null());

    let status = cmd.status().map_err(|e| ExecutionError::Spawn {
        program: interpreter.first().cloned().unwrap_or_default(),
        error: e.to_string(),
    })?;

    Ok(status.success())
}

fn shell(interpreter: &[String], exec_str: &str) -> ExecutionResult<StdCommand> {
    let (program, args) = interpreter
        .split_first()
        .ok_or_else(|| ExecutionError::invalid("interpreter", "must name a program"))?;
    let mut cmd = StdCommand::new(program);
    cmd.args(args);
    cmd.arg(exec_str);
    Ok(cmd)
}
