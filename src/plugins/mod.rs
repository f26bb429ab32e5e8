//! Plugins
//!
//! A plugin registers extensions, task types and tasks on a project, plus
//! callbacks that install defaults on every task of its types once the
//! project file has been applied.

pub mod base;
pub mod service_builder;
pub mod sass;
pub mod theme;
pub mod web;

pub use base::BasePlugin;
pub use service_builder::ServiceBuilderPlugin;
pub use theme::ThemePlugin;
pub use web::{HookPlugin, LayoutPlugin, PortletPlugin};

use crate::engine::project::Project;
use crate::engine::slot::{ResolveView, Value};
use crate::error::{ConfigError, ConfigResult, ExecutionResult};
use crate::runner::{ExternalToolInvoker, JavaLauncher, TaskContext};
use std::path::PathBuf;

/// Something that configures a project
pub trait Plugin {
    /// Stable identifier, also the name used in the project file
    fn id(&self) -> &'static str;

    fn apply(&self, project: &mut Project) -> ConfigResult<()>;
}

/// Names accepted in the `plugins` list of a project file
pub const PLUGIN_NAMES: &[&str] = &[
    "base",
    "theme",
    "portlet",
    "hook",
    "layout",
    "service-builder",
];

/// Look up a plugin by its project file name
pub fn plugin_for(name: &str) -> ConfigResult<Box<dyn Plugin>> {
    match name {
        "base" | "liferay-base" => Ok(Box::new(BasePlugin)),
        "theme" => Ok(Box::new(ThemePlugin)),
        "portlet" => Ok(Box::new(PortletPlugin)),
        "hook" => Ok(Box::new(HookPlugin)),
        "layout" => Ok(Box::new(LayoutPlugin)),
        "service-builder" => Ok(Box::new(ServiceBuilderPlugin)),
        other => Err(ConfigError::UnknownPlugin(other.to_string())),
    }
}

/// Default that copies a slot of an extension
pub(crate) fn from_ext(
    extension: &'static str,
    slot: &'static str,
) -> impl Fn(&ResolveView<'_>) -> ExecutionResult<Value> + 'static {
    move |view| Ok(view.ext(extension)?.value(slot)?.clone())
}

/// Default that joins a relative path onto a path slot of an extension
pub(crate) fn under_ext(
    extension: &'static str,
    slot: &'static str,
    relative: &'static str,
) -> impl Fn(&ResolveView<'_>) -> ExecutionResult<Value> + 'static {
    move |view| Ok(Value::Path(view.ext(extension)?.path(slot)?.join(relative)))
}

/// Classpath slot of a task; unset means empty
pub(crate) fn classpath(ctx: &TaskContext<'_>) -> ExecutionResult<Vec<PathBuf>> {
    match ctx.slots().optional("classpath")? {
        Some(_) => ctx.files("classpath"),
        None => Ok(Vec::new()),
    }
}

/// Generator invoker using the task's `javaExecutable`
pub(crate) fn java_invoker(ctx: &TaskContext<'_>) -> ExecutionResult<ExternalToolInvoker<JavaLauncher>> {
    let java = ctx
        .slots()
        .opt_path("javaExecutable")?
        .unwrap_or_else(|| PathBuf::from("java"));
    Ok(ExternalToolInvoker::new(JavaLauncher::new(java)))
}
