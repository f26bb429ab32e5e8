//! Turning project files into projects and workspaces

use crate::config::parse::{parse_project_file, project_file_in, PROJECT_FILE_NAMES};
use crate::config::schema::validate_project_file;
use crate::config::types::{ProjectFile, SettingValue, Settings, TaskConfig, UserDefaults};
use crate::engine::project::Project;
use crate::engine::slot::{Slots, Value};
use crate::engine::task::Task;
use crate::engine::workspace::Workspace;
use crate::error::{ConfigError, ConfigResult, Result};
use crate::plugins::base::{LIFERAY_EXTENSION, WAR_EXTENSION, WAR_TASK};
use crate::plugins::plugin_for;
use crate::plugins::service_builder::SERVICEBUILDER_EXTENSION;
use crate::plugins::theme::THEME_EXTENSION;
use crate::runner::{conditions_predicate, interpolate_strict, run_shell, Condition};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Task type of custom shell tasks
pub const EXEC_TASK: &str = "exec";

/// Load a project file and every member project it lists
///
/// A file without `projects` yields a workspace holding just that project.
/// Members inherit the `liferay` section of the workspace file.
pub fn load_workspace(path: &Path, defaults: &UserDefaults) -> Result<Workspace> {
    let path = absolute(path)?;
    let root_dir = parent_dir(&path);
    load_dotenv(&root_dir)?;

    let file = parse_project_file(&path)?;
    validate_project_file(&file)?;

    let mut workspace = Workspace::new();
    if file.projects.is_empty() {
        workspace.add(build_project(&file, &root_dir, defaults, &Settings::new())?)?;
        return Ok(workspace);
    }

    for member in &file.projects {
        let member_dir = root_dir.join(member);
        let member_path = project_file_in(&member_dir).ok_or_else(|| {
            ConfigError::NotFound(
                PROJECT_FILE_NAMES
                    .iter()
                    .map(|name| member_dir.join(name).display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        })?;
        load_dotenv(&member_dir)?;

        let member_file = parse_project_file(&member_path)?;
        validate_project_file(&member_file)?;
        if !member_file.projects.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "project '{}' cannot list projects of its own",
                member
            ))
            .into());
        }
        workspace.add(build_project(&member_file, &member_dir, defaults, &file.liferay)?)?;
    }
    Ok(workspace)
}

/// Load a single project file
pub fn load_project(path: &Path, defaults: &UserDefaults) -> Result<Project> {
    let path = absolute(path)?;
    let dir = parent_dir(&path);
    load_dotenv(&dir)?;

    let file = parse_project_file(&path)?;
    validate_project_file(&file)?;
    build_project(&file, &dir, defaults, &Settings::new())
}

/// Build a project from a parsed file
///
/// `liferay` values come from the user defaults, then `inherited`, then the
/// file itself; later layers win.
pub fn build_project(
    file: &ProjectFile,
    dir: &Path,
    defaults: &UserDefaults,
    inherited: &Settings,
) -> Result<Project> {
    let name = file.name.clone().unwrap_or_else(|| {
        dir.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    });
    let mut project = Project::new(name, dir)
        .with_interpreter(file.interpreter.clone().unwrap_or_default());
    project.register_task_type(EXEC_TASK, |name| Task::new(name, EXEC_TASK));

    for plugin in &file.plugins {
        project.apply(plugin_for(plugin)?.as_ref())?;
    }

    let vars = project_vars(&project);

    if project.extensions.contains(LIFERAY_EXTENSION) {
        let mut liferay = defaults.liferay.clone();
        liferay.extend(inherited.iter().map(|(k, v)| (k.clone(), v.clone())));
        liferay.extend(file.liferay.iter().map(|(k, v)| (k.clone(), v.clone())));
        apply_settings(project.extensions.slots_mut(LIFERAY_EXTENSION)?, &liferay, &vars)?;
    } else if !file.liferay.is_empty() {
        return Err(ConfigError::ExtensionNotFound(LIFERAY_EXTENSION.to_string()).into());
    }

    for (extension, settings) in [
        (WAR_EXTENSION, &file.war),
        (THEME_EXTENSION, &file.theme),
        (SERVICEBUILDER_EXTENSION, &file.service_builder),
    ] {
        if !settings.is_empty() {
            apply_settings(project.extensions.slots_mut(extension)?, settings, &vars)?;
        }
    }

    if let Some(package) = &file.package {
        project
            .graph
            .task_mut(WAR_TASK)?
            .slots
            .set("command", package.command.clone())?;
    }

    for (name, config) in &file.tasks {
        configure_task(&mut project, name, config, &vars)?;
    }

    debug!(
        project = %project.name(),
        plugins = ?project.plugins(),
        tasks = project.graph.len(),
        "project loaded"
    );
    Ok(project)
}

fn configure_task(
    project: &mut Project,
    name: &str,
    config: &TaskConfig,
    vars: &HashMap<String, String>,
) -> ConfigResult<()> {
    let defines = config.kind.is_some() || !config.run.is_empty();
    if project.graph.contains(name) {
        if defines {
            return Err(ConfigError::DuplicateTask(name.to_string()));
        }
    } else if let Some(kind) = &config.kind {
        project.create_task(name, kind)?;
    } else if !config.run.is_empty() {
        project.graph.register(exec_task(name, config.run.clone()))?;
    } else {
        return Err(ConfigError::TaskNotFound(name.to_string()));
    }

    let task = project.graph.task_mut(name)?;
    if let Some(description) = &config.description {
        task.description = Some(description.clone());
    }
    if let Some(group) = &config.group {
        task.group = Some(group.clone());
    }
    if task.kind == EXEC_TASK {
        for key in config.settings.keys() {
            task.slots.declare(&camel_case(key));
        }
    }
    apply_settings(&mut task.slots, &config.settings, vars)?;

    for dependency in &config.depends_on {
        task.add_dependency(dependency.clone());
    }

    let conditions: Vec<Condition> = config.only_if.iter().filter_map(Condition::from_config).collect();
    if !conditions.is_empty() {
        task.add_only_if(conditions_predicate(conditions));
    }
    Ok(())
}

/// A task running shell commands in order, stopping at the first failure
pub fn exec_task(name: &str, commands: Vec<String>) -> Task {
    Task::new(name, EXEC_TASK)
        .with_group("custom")
        .with_action(move |ctx| {
            let vars = ctx.vars();
            for command in &commands {
                run_shell(command, &vars, ctx.project_dir(), ctx.interpreter())?;
            }
            Ok(())
        })
}

/// Set explicit values on declared slots
fn apply_settings(
    slots: &mut Slots,
    settings: &Settings,
    vars: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, setting) in settings {
        let value = to_value(setting, vars)?;
        slots.set(&camel_case(key), value)?;
    }
    Ok(())
}

fn to_value(setting: &SettingValue, vars: &HashMap<String, String>) -> ConfigResult<Value> {
    let expand = |s: &str| {
        interpolate_strict(s, vars).map_err(|e| ConfigError::Invalid(e.to_string()))
    };
    Ok(match setting {
        SettingValue::Bool(b) => Value::Bool(*b),
        SettingValue::Int(i) => Value::Int(*i),
        SettingValue::Str(s) => Value::Str(expand(s)?),
        SettingValue::List(items) => Value::Paths(
            items
                .iter()
                .map(|item| expand(item).map(PathBuf::from))
                .collect::<ConfigResult<Vec<_>>>()?,
        ),
    })
}

/// `app-server-dir` to `appServerDir`; camelCase keys pass through
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '-' || c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn project_vars(project: &Project) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("project.name".to_string(), project.name().to_string());
    vars.insert("project.dir".to_string(), project.dir().display().to_string());
    vars
}

/// Load `.env` from `dir` if present; variables already set are kept
fn load_dotenv(dir: &Path) -> ConfigResult<()> {
    let path = dir.join(".env");
    if !path.is_file() {
        return Ok(());
    }
    dotenvy::from_path(&path).map_err(|e| ConfigError::ReadFile {
        path: path.clone(),
        error: e.to_string(),
    })?;
    debug!(path = %path.display(), "loaded environment file");
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
