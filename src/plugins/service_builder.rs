//! Service builder plugin: generates the persistence and service layers from `service.xml`

use crate::engine::project::Project;
use crate::engine::slot::Value;
use crate::engine::task::Task;
use crate::error::{ConfigResult, ExecutionResult};
use crate::plugins::base::{BasePlugin, LIFERAY_EXTENSION, WAR_EXTENSION};
use crate::plugins::{classpath, from_ext, java_invoker, under_ext, Plugin};
use crate::runner::{Invocation, TaskContext};
use std::fs;
use std::path::PathBuf;

pub const SERVICEBUILDER_EXTENSION: &str = "servicebuilder";
pub const GENERATE_SERVICE_TASK: &str = "generateService";

const SERVICE_BUILDER: &str = "com.liferay.portal.tools.servicebuilder.ServiceBuilder";

/// Jars of the global lib dir the generator needs besides the portal classpath
const GLOBAL_LIB_JARS: &[&str] = &["commons-digester.jar", "commons-lang.jar", "easyconf.jar"];

/// Spring and persistence descriptors below `resourceDir/META-INF`
const DESCRIPTORS: &[(&str, &str)] = &[
    ("service.hbm.file", "portlet-hbm.xml"),
    ("service.orm.file", "portlet-orm.xml"),
    ("service.model.hints.file", "portlet-model-hints.xml"),
    ("service.spring.file", "portlet-spring.xml"),
    ("service.spring.base.file", "base-spring.xml"),
    ("service.spring.cluster.file", "cluster-spring.xml"),
    ("service.spring.dynamic.data.source.file", "dynamic-data-source-spring.xml"),
    ("service.spring.hibernate.file", "hibernate-spring.xml"),
    ("service.spring.infrastructure.file", "infrastructure-spring.xml"),
    ("service.spring.shard.data.source.file", "shard-data-source-spring.xml"),
];

pub struct ServiceBuilderPlugin;

impl Plugin for ServiceBuilderPlugin {
    fn id(&self) -> &'static str {
        "service-builder"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        project.apply(&BasePlugin)?;
        let plugin_name = project.name().to_string();

        let ext = project.ensure_extension(SERVICEBUILDER_EXTENSION)?.slots_mut();
        for name in [
            "implSrcDir",
            "apiSrcDir",
            "resourceDir",
            "jalopyInputFile",
            "serviceInputFile",
            "pluginName",
        ] {
            ext.declare(name);
        }
        ext.set_default("implSrcDir", under_ext(WAR_EXTENSION, "projectDir", "src/main/java"))?;
        ext.set_default("apiSrcDir", under_ext(WAR_EXTENSION, "projectDir", "src/service/java"))?;
        ext.set_default("resourceDir", under_ext(WAR_EXTENSION, "projectDir", "src/main/resources"))?;
        ext.set_default(
            "serviceInputFile",
            under_ext(WAR_EXTENSION, "webAppDir", "WEB-INF/service.xml"),
        )?;
        ext.set_default("pluginName", move |_| Ok(Value::Str(plugin_name.clone())))?;

        project.register_task_type(GENERATE_SERVICE_TASK, generate_service_task);
        project.create_task(GENERATE_SERVICE_TASK, GENERATE_SERVICE_TASK)?;

        project.after_evaluate("generateService defaults", |_, graph| {
            for task in graph.tasks_of_kind_mut(GENERATE_SERVICE_TASK) {
                let slots = &mut task.slots;
                for name in [
                    "implSrcDir",
                    "apiSrcDir",
                    "resourceDir",
                    "jalopyInputFile",
                    "serviceInputFile",
                    "pluginName",
                ] {
                    slots.set_default(name, from_ext(SERVICEBUILDER_EXTENSION, name))?;
                }
                slots.set_default("webAppDir", from_ext(WAR_EXTENSION, "webAppDir"))?;
                slots.set_default("workingDir", under_ext(WAR_EXTENSION, "buildDir", "servicebuilder"))?;
                slots.set_default("javaExecutable", from_ext(LIFERAY_EXTENSION, "javaExecutable"))?;
                slots.set_default("classpath", |view| {
                    let liferay = view.ext(LIFERAY_EXTENSION)?;
                    let mut classpath = liferay.paths("portalClasspath")?;
                    if let Some(global) = liferay.opt_path("appServerGlobalLibDir")? {
                        classpath.extend(GLOBAL_LIB_JARS.iter().map(|jar| global.join(jar)));
                    }
                    Ok(Value::Paths(classpath))
                })?;
            }
            Ok(())
        })
    }
}

pub fn generate_service_task(name: &str) -> Task {
    Task::new(name, GENERATE_SERVICE_TASK)
        .with_description("Builds a liferay service")
        .with_group("liferay")
        .with_required_slot("serviceInputFile")
        .with_slot("jalopyInputFile")
        .with_required_slot("implSrcDir")
        .with_required_slot("apiSrcDir")
        .with_required_slot("resourceDir")
        .with_required_slot("webAppDir")
        .with_required_slot("pluginName")
        .with_required_slot("workingDir")
        .with_slot("classpath")
        .with_slot("javaExecutable")
        .only_if(|ctx| ctx.file("serviceInputFile").map_or(false, |file| file.is_file()))
        .with_action(generate_service)
}

/// The generator call for one service
pub fn service_invocation(ctx: &TaskContext<'_>) -> ExecutionResult<Invocation> {
    let resource_dir = ctx.file("resourceDir")?;
    let web_app_dir = ctx.file("webAppDir")?;
    let sql_dir = web_app_dir.join("WEB-INF").join("sql");
    let meta_inf = resource_dir.join("META-INF");

    let mut invocation = Invocation::new(SERVICE_BUILDER, ctx.file("workingDir")?)
        .with_classpath(classpath(ctx)?)
        .system_property(
            "external-properties",
            "com/liferay/portal/tools/dependencies/portal-tools.properties",
        )
        .system_property(
            "org.apache.commons.logging.Log",
            "org.apache.commons.logging.impl.Log4JLogger",
        )
        .arg("service.input.file", ctx.file("serviceInputFile")?.display());

    for (key, descriptor) in DESCRIPTORS {
        invocation = invocation.arg(key, meta_inf.join(descriptor).display());
    }

    invocation = invocation
        .arg("service.api.dir", ctx.file("apiSrcDir")?.display())
        .arg("service.impl.dir", ctx.file("implSrcDir")?.display())
        .arg("service.json.file", web_app_dir.join("js").join("service.js").display())
        .arg("service.sql.dir", sql_dir.display())
        .arg("service.sql.file", "tables.sql")
        .arg("service.sql.indexes.file", "indexes.sql")
        .arg("service.sql.indexes.properties.file", "indexes.properties")
        .arg("service.sql.sequences.file", "sequences.sql")
        .arg("service.auto.namespace.tables", true)
        .arg("service.bean.locator.util", "com.liferay.util.bean.PortletBeanLocatorUtil")
        .arg("service.props.util", "com.liferay.util.service.ServiceProps")
        .arg("service.plugin.name", ctx.string("pluginName")?);

    if let Some(jalopy) = ctx.opt_file("jalopyInputFile")? {
        invocation = invocation.stage(jalopy, PathBuf::from("misc").join("jalopy.xml"));
    }
    Ok(invocation)
}

fn generate_service(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let invocation = service_invocation(ctx)?;

    fs::create_dir_all(ctx.file("implSrcDir")?)?;
    fs::create_dir_all(ctx.file("webAppDir")?.join("WEB-INF").join("sql"))?;
    fs::create_dir_all(invocation.working_dir.join("misc"))?;

    java_invoker(ctx)?.run(&invocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn project() -> Project {
        let mut project = Project::new("calendar-portlet", "/work/calendar-portlet");
        project.apply(&ServiceBuilderPlugin).unwrap();
        project
    }

    #[test]
    fn test_extension_conventions() {
        let mut project = project();
        project.evaluate().unwrap();

        let task = project.graph.get(GENERATE_SERVICE_TASK).unwrap();
        let root = Path::new("/work/calendar-portlet");
        assert_eq!(task.slots.path("implSrcDir").unwrap(), root.join("src/main/java"));
        assert_eq!(task.slots.path("apiSrcDir").unwrap(), root.join("src/service/java"));
        assert_eq!(task.slots.path("resourceDir").unwrap(), root.join("src/main/resources"));
        assert_eq!(
            task.slots.path("serviceInputFile").unwrap(),
            root.join("src/main/webapp/WEB-INF/service.xml")
        );
        assert_eq!(task.slots.path("workingDir").unwrap(), root.join("build/servicebuilder"));
        assert_eq!(task.slots.string("pluginName").unwrap(), "calendar-portlet");
        assert!(task.slots.optional("jalopyInputFile").unwrap().is_none());
    }

    #[test]
    fn test_classpath_adds_global_jars() {
        let mut project = project();
        project
            .extensions
            .slots_mut(LIFERAY_EXTENSION)
            .unwrap()
            .set("appServerDir", PathBuf::from("/nonexistent/tomcat"))
            .unwrap();
        project.evaluate().unwrap();

        let classpath = project
            .graph
            .get(GENERATE_SERVICE_TASK)
            .unwrap()
            .slots
            .paths("classpath")
            .unwrap();
        assert_eq!(
            classpath,
            vec![
                PathBuf::from("/nonexistent/tomcat/webapps/ROOT/WEB-INF/classes"),
                PathBuf::from("/nonexistent/tomcat/lib/ext/commons-digester.jar"),
                PathBuf::from("/nonexistent/tomcat/lib/ext/commons-lang.jar"),
                PathBuf::from("/nonexistent/tomcat/lib/ext/easyconf.jar"),
            ]
        );
    }

    #[test]
    fn test_invocation_argument_order() {
        let mut project = project();
        project
            .extensions
            .slots_mut(SERVICEBUILDER_EXTENSION)
            .unwrap()
            .set("jalopyInputFile", "misc/jalopy.xml")
            .unwrap();
        project.evaluate().unwrap();

        let siblings = crate::engine::workspace::NoSiblings;
        let env = crate::runner::ProjectEnv::new(
            "calendar-portlet",
            project.dir(),
            &project.extensions,
            &siblings,
        );
        let task = project.graph.get(GENERATE_SERVICE_TASK).unwrap();
        let ctx = TaskContext::new(task, &env);
        let invocation = service_invocation(&ctx).unwrap();

        let keys: Vec<&str> = invocation
            .args
            .iter()
            .map(|arg| arg.split('=').next().unwrap())
            .collect();
        assert_eq!(keys.first(), Some(&"service.input.file"));
        assert_eq!(keys[1], "service.hbm.file");
        assert_eq!(keys.last(), Some(&"service.plugin.name"));
        assert_eq!(keys.len(), 23);
        assert!(invocation
            .args
            .contains(&"service.sql.dir=/work/calendar-portlet/src/main/webapp/WEB-INF/sql".to_string()));
        assert_eq!(invocation.jvm_args.len(), 2);
        assert_eq!(invocation.staged.len(), 1);
        assert_eq!(invocation.staged[0].source, PathBuf::from("/work/calendar-portlet/misc/jalopy.xml"));
        assert_eq!(invocation.staged[0].target, PathBuf::from("misc/jalopy.xml"));
    }
}
