//! Base plugin: project conventions, the portal installation and deployment

use crate::engine::project::Project;
use crate::engine::slot::{Slots, Value};
use crate::engine::task::Task;
use crate::error::{ConfigResult, ExecutionError, ExecutionResult};
use crate::plugins::{from_ext, Plugin};
use crate::runner::{run_shell, TaskContext};
use crate::utils::copy_file;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const WAR_EXTENSION: &str = "war";
pub const LIFERAY_EXTENSION: &str = "liferay";

pub const WAR_TASK: &str = "war";
pub const DEPLOY_TASK: &str = "deploy";

pub struct BasePlugin;

impl Plugin for BasePlugin {
    fn id(&self) -> &'static str {
        "liferay-base"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        let project_dir = project.dir().to_path_buf();
        let archive_name = format!("{}.war", project.name());

        let war = project.ensure_extension(WAR_EXTENSION)?.slots_mut();
        declare_war_extension(war, project_dir, archive_name)?;

        let liferay = project.ensure_extension(LIFERAY_EXTENSION)?.slots_mut();
        declare_liferay_extension(liferay)?;

        project.register_task_type(WAR_TASK, war_task);
        project.register_task_type(DEPLOY_TASK, deploy_task);
        project.create_task(WAR_TASK, WAR_TASK)?;
        project.create_task(DEPLOY_TASK, DEPLOY_TASK)?;

        project.after_evaluate("war defaults", |_, graph| {
            for task in graph.tasks_of_kind_mut(WAR_TASK) {
                task.slots.set_default("webAppDir", from_ext(WAR_EXTENSION, "webAppDir"))?;
                task.slots.set_default("archivePath", from_ext(WAR_EXTENSION, "archivePath"))?;
            }
            Ok(())
        })?;
        project.after_evaluate("deploy defaults", |_, graph| {
            for task in graph.tasks_of_kind_mut(DEPLOY_TASK) {
                task.slots.set_default("warFile", from_ext(WAR_EXTENSION, "archivePath"))?;
                task.slots.set_default("autoDeployDir", from_ext(LIFERAY_EXTENSION, "autoDeployDir"))?;
            }
            Ok(())
        })
    }
}

fn declare_war_extension(
    war: &mut Slots,
    project_dir: PathBuf,
    archive_name: String,
) -> ConfigResult<()> {
    for name in ["projectDir", "buildDir", "webAppDir", "archiveName", "archivePath"] {
        war.declare(name);
    }
    war.set("projectDir", project_dir)?;
    war.set_default("buildDir", |view| {
        Ok(Value::Path(view.siblings()?.path("projectDir")?.join("build")))
    })?;
    war.set_default("webAppDir", |view| {
        Ok(Value::Path(
            view.siblings()?.path("projectDir")?.join("src/main/webapp"),
        ))
    })?;
    war.set_default("archiveName", move |_| Ok(Value::Str(archive_name.clone())))?;
    war.set_default("archivePath", |view| {
        let own = view.siblings()?;
        let name = own.string("archiveName")?;
        Ok(Value::Path(own.path("buildDir")?.join("libs").join(name)))
    })
}

fn declare_liferay_extension(liferay: &mut Slots) -> ConfigResult<()> {
    for name in [
        "appServerDir",
        "appServerGlobalLibDir",
        "appServerPortalDir",
        "autoDeployDir",
        "portalClasspath",
        "javaExecutable",
    ] {
        liferay.declare(name);
    }
    liferay.set_default("appServerGlobalLibDir", |view| {
        Ok(Value::Path(view.siblings()?.path("appServerDir")?.join("lib/ext")))
    })?;
    liferay.set_default("appServerPortalDir", |view| {
        Ok(Value::Path(
            view.siblings()?.path("appServerDir")?.join("webapps/ROOT"),
        ))
    })?;
    liferay.set_default("autoDeployDir", |view| {
        Ok(Value::Path(view.siblings()?.path("appServerDir")?.join("../deploy")))
    })?;
    liferay.set_default("portalClasspath", |view| {
        let own = view.siblings()?;
        let portal = own.path("appServerPortalDir")?;
        let mut classpath = vec![portal.join("WEB-INF").join("classes")];
        classpath.extend(jars_in(&portal.join("WEB-INF").join("lib"))?);
        if let Some(global) = own.opt_path("appServerGlobalLibDir")? {
            classpath.extend(jars_in(&global)?);
        }
        Ok(Value::Paths(classpath))
    })?;
    liferay.set_default("javaExecutable", |_| {
        let java = match std::env::var_os("JAVA_HOME") {
            Some(home) => PathBuf::from(home).join("bin").join("java"),
            None => PathBuf::from("java"),
        };
        Ok(Value::Path(java))
    })
}

/// Jar files directly inside `dir`, sorted; a missing directory has none
pub(crate) fn jars_in(dir: &Path) -> ExecutionResult<Vec<PathBuf>> {
    let pattern = format!("{}/*.jar", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .map_err(|e| ExecutionError::invalid("portalClasspath", e.to_string()))?;
    let mut jars: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
    jars.sort();
    Ok(jars)
}

/// Packages the web application with the configured shell command
pub fn war_task(name: &str) -> Task {
    Task::new(name, WAR_TASK)
        .with_description("Assembles the web archive")
        .with_group("build")
        .with_required_slot("webAppDir")
        .with_required_slot("archivePath")
        .with_slot("command")
        .only_if(|ctx| matches!(ctx.slots().optional("command"), Ok(Some(_))))
        .with_action(package)
}

fn package(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let command = ctx.string("command")?;
    let archive = ctx.file("archivePath")?;
    let web_app_dir = ctx.file("webAppDir")?;
    if let Some(parent) = archive.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut vars = ctx.vars();
    vars.insert("projectDir".to_string(), ctx.project_dir().display().to_string());
    vars.insert("archivePath".to_string(), archive.display().to_string());
    vars.insert("webAppDir".to_string(), web_app_dir.display().to_string());
    run_shell(&command, &vars, ctx.project_dir(), ctx.interpreter())
}

/// Copies the archive into the portal's auto deploy directory
pub fn deploy_task(name: &str) -> Task {
    Task::new(name, DEPLOY_TASK)
        .with_description("Deploys the plugin")
        .with_group("liferay")
        .with_required_slot("warFile")
        .with_required_slot("autoDeployDir")
        .depends_on(WAR_TASK)
        .with_action(deploy)
}

fn deploy(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let war_file = ctx.file("warFile")?;
    let auto_deploy_dir = ctx.file("autoDeployDir")?;

    let file_name = match war_file.file_name() {
        Some(file_name) if war_file.is_file() => file_name.to_owned(),
        _ => {
            return Err(ExecutionError::invalid(
                "warFile",
                format!("'{}' does not exist", war_file.display()),
            ))
        }
    };

    let target = auto_deploy_dir.join(file_name);
    copy_file(&war_file, &target)?;
    info!(war = %war_file.display(), to = %auto_deploy_dir.display(), "deployed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::task::TaskState;
    use crate::error::{BuildError, ConfigError};
    use tempfile::TempDir;

    fn project(dir: &Path) -> Project {
        let mut project = Project::new("calendar-portlet", dir);
        project.apply(&BasePlugin).unwrap();
        project
    }

    #[test]
    fn test_war_extension_conventions() {
        let mut project = project(Path::new("/work/calendar-portlet"));
        project.evaluate().unwrap();

        let war = project.extensions.slots(WAR_EXTENSION).unwrap();
        assert_eq!(war.path("buildDir").unwrap(), PathBuf::from("/work/calendar-portlet/build"));
        assert_eq!(
            war.path("webAppDir").unwrap(),
            PathBuf::from("/work/calendar-portlet/src/main/webapp")
        );
        assert_eq!(
            war.path("archivePath").unwrap(),
            PathBuf::from("/work/calendar-portlet/build/libs/calendar-portlet.war")
        );
    }

    #[test]
    fn test_deploy_defaults() {
        let mut project = project(Path::new("/work/calendar-portlet"));
        project
            .extensions
            .slots_mut(LIFERAY_EXTENSION)
            .unwrap()
            .set("appServerDir", PathBuf::from("/opt/tomcat"))
            .unwrap();
        project.evaluate().unwrap();

        let deploy = project.graph.get(DEPLOY_TASK).unwrap();
        assert_eq!(
            deploy.slots.path("autoDeployDir").unwrap(),
            PathBuf::from("/opt/tomcat/../deploy")
        );
        assert_eq!(
            deploy.slots.path("warFile").unwrap(),
            PathBuf::from("/work/calendar-portlet/build/libs/calendar-portlet.war")
        );
    }

    #[test]
    fn test_deploy_overrides() {
        let mut project = project(Path::new("/work/calendar-portlet"));
        let deploy = project.graph.task_mut(DEPLOY_TASK).unwrap();
        deploy.slots.set("autoDeployDir", PathBuf::from("/srv/deploy")).unwrap();
        deploy.slots.set("warFile", PathBuf::from("/tmp/other.war")).unwrap();
        project.evaluate().unwrap();

        let deploy = project.graph.get(DEPLOY_TASK).unwrap();
        assert_eq!(deploy.slots.path("autoDeployDir").unwrap(), PathBuf::from("/srv/deploy"));
        assert_eq!(deploy.slots.path("warFile").unwrap(), PathBuf::from("/tmp/other.war"));
    }

    #[test]
    fn test_portal_classpath() {
        let dir = TempDir::new().unwrap();
        let portal = dir.path().join("webapps/ROOT");
        fs::create_dir_all(portal.join("WEB-INF/lib")).unwrap();
        fs::write(portal.join("WEB-INF/lib/portal-impl.jar"), "").unwrap();
        fs::write(portal.join("WEB-INF/lib/notes.txt"), "").unwrap();
        fs::create_dir_all(dir.path().join("lib/ext")).unwrap();
        fs::write(dir.path().join("lib/ext/portal-service.jar"), "").unwrap();

        let mut project = project(dir.path());
        project
            .extensions
            .slots_mut(LIFERAY_EXTENSION)
            .unwrap()
            .set("appServerDir", dir.path())
            .unwrap();
        project.evaluate().unwrap();

        let classpath = project
            .extensions
            .slots(LIFERAY_EXTENSION)
            .unwrap()
            .paths("portalClasspath")
            .unwrap();
        assert_eq!(
            classpath,
            vec![
                portal.join("WEB-INF/classes"),
                portal.join("WEB-INF/lib/portal-impl.jar"),
                dir.path().join("lib/ext/portal-service.jar"),
            ]
        );
    }

    #[test]
    fn test_deploy_without_app_server_is_missing_property() {
        let dir = TempDir::new().unwrap();
        let mut project = project(dir.path());
        let result = project.run(&[DEPLOY_TASK.to_string()]);
        assert!(matches!(
            result,
            Err(BuildError::Config(ConfigError::MissingRequiredProperty { ref slot, .. })) if slot == "autoDeployDir"
        ));
    }

    #[test]
    fn test_deploy_copies_war() {
        let dir = TempDir::new().unwrap();
        let war = dir.path().join("build/libs/calendar-portlet.war");
        fs::create_dir_all(war.parent().unwrap()).unwrap();
        fs::write(&war, "war").unwrap();

        let mut project = project(dir.path());
        project
            .graph
            .task_mut(DEPLOY_TASK)
            .unwrap()
            .slots
            .set("autoDeployDir", dir.path().join("deploy"))
            .unwrap();

        let report = project.run(&[DEPLOY_TASK.to_string()]).unwrap();
        assert_eq!(report.state_of(WAR_TASK), Some(TaskState::Skipped));
        assert_eq!(report.state_of(DEPLOY_TASK), Some(TaskState::Succeeded));
        assert!(dir.path().join("deploy/calendar-portlet.war").is_file());
    }

    #[test]
    fn test_deploy_missing_war_fails() {
        let dir = TempDir::new().unwrap();
        let mut project = project(dir.path());
        project
            .graph
            .task_mut(DEPLOY_TASK)
            .unwrap()
            .slots
            .set("autoDeployDir", dir.path().join("deploy"))
            .unwrap();

        let result = project.run(&[DEPLOY_TASK.to_string()]);
        match result {
            Err(BuildError::TaskFailed { task, source }) => {
                assert_eq!(task, DEPLOY_TASK);
                assert!(matches!(source, ExecutionError::InvalidPropertyValue { .. }));
            }
            other => panic!("expected deploy to fail, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_war_runs_packaging_command() {
        let dir = TempDir::new().unwrap();
        let mut project = project(dir.path());
        project
            .graph
            .task_mut(WAR_TASK)
            .unwrap()
            .slots
            .set("command", "echo packed > ${archivePath}")
            .unwrap();

        project.run(&[WAR_TASK.to_string()]).unwrap();
        let war = dir.path().join("build/libs/calendar-portlet.war");
        assert_eq!(fs::read_to_string(war).unwrap().trim(), "packed");
    }
}
