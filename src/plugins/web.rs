//! Portlet, hook and layout plugins

use crate::engine::project::Project;
use crate::error::ConfigResult;
use crate::plugins::base::BasePlugin;
use crate::plugins::{sass, Plugin};

/// A portlet: the base conventions plus CSS generation before packaging
pub struct PortletPlugin;

impl Plugin for PortletPlugin {
    fn id(&self) -> &'static str {
        "portlet"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        project.apply(&BasePlugin)?;
        sass::install(project)
    }
}

pub struct HookPlugin;

impl Plugin for HookPlugin {
    fn id(&self) -> &'static str {
        "hook"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        project.apply(&BasePlugin)
    }
}

pub struct LayoutPlugin;

impl Plugin for LayoutPlugin {
    fn id(&self) -> &'static str {
        "layout"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        project.apply(&BasePlugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::base::WAR_TASK;
    use crate::plugins::service_builder::{ServiceBuilderPlugin, GENERATE_SERVICE_TASK};

    #[test]
    fn test_portlet_war_waits_for_sass() {
        let mut project = Project::new("calendar-portlet", "/work/calendar-portlet");
        project.apply(&PortletPlugin).unwrap();

        let war = project.graph.get(WAR_TASK).unwrap();
        assert_eq!(war.depends_on, vec![sass::SASS_TASK.to_string()]);
    }

    #[test]
    fn test_hook_adds_only_base_tasks() {
        let mut project = Project::new("login-hook", "/work/login-hook");
        project.apply(&HookPlugin).unwrap();

        let names: Vec<&str> = project.graph.tasks().map(|task| task.name.as_str()).collect();
        assert_eq!(names, vec!["war", "deploy"]);
    }

    #[test]
    fn test_service_builder_combines_with_portlet() {
        let mut project = Project::new("calendar-portlet", "/work/calendar-portlet");
        project.apply(&PortletPlugin).unwrap();
        project.apply(&ServiceBuilderPlugin).unwrap();

        assert!(project.graph.contains(GENERATE_SERVICE_TASK));
        assert!(project.graph.contains(sass::SASS_TASK));
        assert_eq!(project.plugins(), &["portlet", "liferay-base", "service-builder"]);
    }
}
