//! `sassToCss`: compiles the Sass sources of a web application

use crate::engine::project::Project;
use crate::engine::task::Task;
use crate::error::{ConfigResult, ExecutionResult};
use crate::plugins::base::{LIFERAY_EXTENSION, WAR_EXTENSION, WAR_TASK};
use crate::plugins::{classpath, from_ext, java_invoker};
use crate::runner::{Invocation, TaskContext};

pub const SASS_TASK: &str = "sassToCss";

const SASS_BUILDER: &str = "com.liferay.portal.tools.SassToCssBuilder";

/// Register the task type and a `sassToCss` task that `war` waits for
pub fn install(project: &mut Project) -> ConfigResult<()> {
    if project.graph.contains(SASS_TASK) {
        return Ok(());
    }
    project.register_task_type(SASS_TASK, sass_task);
    project.create_task(SASS_TASK, SASS_TASK)?;
    project.graph.add_dependency(WAR_TASK, SASS_TASK)?;

    project.after_evaluate("sassToCss defaults", |_, graph| {
        for task in graph.tasks_of_kind_mut(SASS_TASK) {
            task.slots.set_default("classpath", from_ext(LIFERAY_EXTENSION, "portalClasspath"))?;
            task.slots.set_default("javaExecutable", from_ext(LIFERAY_EXTENSION, "javaExecutable"))?;
            task.slots
                .set_default("appServerPortalDir", from_ext(LIFERAY_EXTENSION, "appServerPortalDir"))?;
            task.slots.set_default("sassDir", from_ext(WAR_EXTENSION, "webAppDir"))?;
        }
        Ok(())
    })
}

pub fn sass_task(name: &str) -> Task {
    Task::new(name, SASS_TASK)
        .with_description("Compiles Sass files to CSS")
        .with_group("build")
        .with_slot("classpath")
        .with_slot("javaExecutable")
        .with_required_slot("appServerPortalDir")
        .with_required_slot("sassDir")
        .with_action(compile_sass)
}

/// The generator call for one project
pub fn sass_invocation(ctx: &TaskContext<'_>) -> ExecutionResult<Invocation> {
    let portal_dir = ctx.file("appServerPortalDir")?;
    let sass_dir = ctx.file("sassDir")?;

    Ok(Invocation::new(SASS_BUILDER, ctx.project_dir())
        .with_classpath(classpath(ctx)?)
        .system_property("liferay.lib.portal.dir", portal_dir.join("WEB-INF").join("lib").display())
        .arg("sass.dir", "/")
        .arg("sass.docroot.dir", sass_dir.display())
        .arg(
            "sass.portal.common.dir",
            portal_dir.join("html").join("css").join("common").display(),
        ))
}

fn compile_sass(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let invocation = sass_invocation(ctx)?;
    java_invoker(ctx)?.run(&invocation)
}
