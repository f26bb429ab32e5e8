//! Project file validation
//!
//! Checks that need nothing but the file itself. Checks against the tasks
//! and slots that plugins define happen while the project is built.

use crate::config::types::{ProjectFile, SettingValue, TaskConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::plugins::plugin_for;
use crate::theme::ThemeType;
use std::collections::{BTreeMap, HashSet};

/// Validate a complete project file
pub fn validate_project_file(file: &ProjectFile) -> ConfigResult<()> {
    for plugin in &file.plugins {
        plugin_for(plugin)?;
    }

    validate_theme(file)?;

    for (name, task) in &file.tasks {
        validate_task(name, task)?;
    }
    detect_circular_task_dependencies(&file.tasks)?;

    let mut seen = HashSet::new();
    for project in &file.projects {
        if project.trim().is_empty() {
            return Err(ConfigError::Invalid("empty project directory in 'projects'".to_string()));
        }
        if !seen.insert(project.as_str()) {
            return Err(ConfigError::DuplicateProject(project.clone()));
        }
    }

    Ok(())
}

fn validate_theme(file: &ProjectFile) -> ConfigResult<()> {
    match file.theme.get("theme-type") {
        Some(SettingValue::Str(theme_type)) => {
            theme_type.parse::<ThemeType>()?;
        }
        Some(other) => {
            return Err(ConfigError::Invalid(format!(
                "theme-type must be 'vm' or 'ftl', got {:?}",
                other
            )));
        }
        None => {}
    }
    if file.theme.contains_key("parent-theme-name")
        && file.theme.contains_key("parent-theme-project-name")
    {
        return Err(ConfigError::MutuallyExclusiveConfiguration {
            first: "parentThemeName".to_string(),
            second: "parentThemeProjectName".to_string(),
        });
    }
    Ok(())
}

/// Validate a single task
pub fn validate_task(name: &str, task: &TaskConfig) -> ConfigResult<()> {
    if task.kind.is_some() && !task.run.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "task '{}' cannot have both 'type' and 'run'",
            name
        )));
    }
    if task.depends_on.iter().any(|dep| dep == name) {
        return Err(ConfigError::CircularDependency(format!("{} -> {}", name, name)));
    }
    for condition in &task.only_if {
        let set = [
            condition.equal.is_some(),
            condition.not_equal.is_some(),
            condition.command.is_some(),
            condition.exists.is_some(),
            condition.not_exists.is_some(),
            condition.env_set.is_some(),
            condition.env_not_set.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if set != 1 {
            return Err(ConfigError::Invalid(format!(
                "each only-if entry of task '{}' must name exactly one condition",
                name
            )));
        }
    }
    Ok(())
}

/// Detect cycles among the `depends-on` edges declared in the file
///
/// Edges to tasks the file does not mention belong to plugins and are checked
/// once the graph is complete.
fn detect_circular_task_dependencies(tasks: &BTreeMap<String, TaskConfig>) -> ConfigResult<()> {
    let mut visited = HashSet::new();
    for task_name in tasks.keys() {
        let mut stack = Vec::new();
        check_task_cycle(tasks, task_name, &mut visited, &mut stack)?;
    }
    Ok(())
}

fn check_task_cycle(
    tasks: &BTreeMap<String, TaskConfig>,
    task_name: &str,
    visited: &mut HashSet<String>,
    stack: &mut Vec<String>,
) -> ConfigResult<()> {
    if let Some(start) = stack.iter().position(|name| name == task_name) {
        let mut cycle = stack[start..].to_vec();
        cycle.push(task_name.to_string());
        return Err(ConfigError::CircularDependency(cycle.join(" -> ")));
    }

    if visited.contains(task_name) {
        return Ok(());
    }

    let Some(task) = tasks.get(task_name) else {
        return Ok(());
    };

    stack.push(task_name.to_string());
    for dependency in &task.depends_on {
        check_task_cycle(tasks, dependency, visited, stack)?;
    }
    stack.pop();
    visited.insert(task_name.to_string());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse::parse_project;

    fn validate(yaml: &str) -> ConfigResult<()> {
        validate_project_file(&parse_project(yaml).unwrap())
    }

    #[test]
    fn test_validate_unknown_plugin() {
        let result = validate("plugins: [theme, ext]\n");
        assert!(matches!(result, Err(ConfigError::UnknownPlugin(ref name)) if name == "ext"));
    }

    #[test]
    fn test_validate_theme_type() {
        let result = validate("plugins: [theme]\ntheme:\n  theme-type: jsp\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_theme_type_not_a_string() {
        for yaml in [
            "plugins: [theme]\ntheme:\n  theme-type: 5\n",
            "plugins: [theme]\ntheme:\n  theme-type: [vm]\n",
        ] {
            assert!(matches!(validate(yaml), Err(ConfigError::Invalid(_))), "{}", yaml);
        }
    }

    #[test]
    fn test_validate_both_parents() {
        let yaml = r#"
plugins: [theme]
theme:
  parent-theme-name: classic
  parent-theme-project-name: base-theme
"#;
        assert!(matches!(
            validate(yaml),
            Err(ConfigError::MutuallyExclusiveConfiguration { .. })
        ));
    }

    #[test]
    fn test_validate_type_and_run() {
        let yaml = r#"
tasks:
  otherMerge:
    type: mergeTheme
    run: echo merge
"#;
        assert!(matches!(validate(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_detect_circular_dependency() {
        let yaml = r#"
tasks:
  a:
    depends-on: b
    run: echo a
  b:
    depends-on: [c]
    run: echo b
  c:
    depends-on: [a]
    run: echo c
"#;
        let result = validate(yaml);
        assert!(matches!(
            result,
            Err(ConfigError::CircularDependency(ref path)) if path == "a -> b -> c -> a"
        ));
    }

    #[test]
    fn test_condition_must_name_one_check() {
        let yaml = r#"
tasks:
  lint:
    run: echo lint
    only-if:
      - exists: a
        env-set: B
"#;
        assert!(matches!(validate(yaml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_project() {
        let yaml = "projects: [base-theme, blue-theme, base-theme]\n";
        assert!(matches!(validate(yaml), Err(ConfigError::DuplicateProject(_))));
    }

    #[test]
    fn test_validate_valid_project() {
        let yaml = r#"
plugins: [portlet, service-builder]
liferay:
  app-server-dir: /opt/tomcat
tasks:
  deploy:
    depends-on: lint
  lint:
    run: echo lint
"#;
        assert!(validate(yaml).is_ok());
    }
}
