//! Theme plugin: layered theme merge, thumbnail and CSS generation

use crate::engine::project::Project;
use crate::engine::slot::{Slots, Value};
use crate::engine::task::Task;
use crate::error::{ConfigError, ConfigResult, ExecutionError, ExecutionResult};
use crate::plugins::base::{BasePlugin, LIFERAY_EXTENSION, WAR_EXTENSION, WAR_TASK};
use crate::plugins::{classpath, from_ext, java_invoker, sass, under_ext, Plugin};
use crate::runner::{Invocation, TaskContext};
use crate::theme::{merge_theme, MergeRequest, ParentTheme, ThemeType, MERGE_TASK};
use tracing::info;

pub const THEME_EXTENSION: &str = "theme";
pub const THUMBNAIL_TASK: &str = "buildThumbnail";

const THUMBNAIL_BUILDER: &str = "com.liferay.portal.tools.ThumbnailBuilder";

pub struct ThemePlugin;

impl Plugin for ThemePlugin {
    fn id(&self) -> &'static str {
        "theme"
    }

    fn apply(&self, project: &mut Project) -> ConfigResult<()> {
        project.apply(&BasePlugin)?;

        let theme = project.ensure_extension(THEME_EXTENSION)?.slots_mut();
        for name in ["parentThemeName", "parentThemeProjectName", "themeType", "diffsDir"] {
            theme.declare(name);
        }
        theme.set_default("themeType", |_| Ok(Value::from(ThemeType::default().extension())))?;
        theme.set_default("diffsDir", under_ext(WAR_EXTENSION, "projectDir", "src/main/diffs"))?;

        // merged output goes under the build directory
        project
            .extensions
            .slots_mut(WAR_EXTENSION)?
            .set_default("webAppDir", |view| {
                Ok(Value::Path(view.siblings()?.path("buildDir")?.join("webapp")))
            })?;

        project.register_task_type(MERGE_TASK, merge_task);
        project.register_task_type(THUMBNAIL_TASK, thumbnail_task);
        project.create_task(MERGE_TASK, MERGE_TASK)?;
        project.create_task(THUMBNAIL_TASK, THUMBNAIL_TASK)?;

        sass::install(project)?;
        project.graph.add_dependency(sass::SASS_TASK, MERGE_TASK)?;
        project.graph.add_dependency(WAR_TASK, THUMBNAIL_TASK)?;

        project.after_evaluate("mergeTheme defaults", |_, graph| {
            for task in graph.tasks_of_kind_mut(MERGE_TASK) {
                let slots = &mut task.slots;
                slots.set_default("parentThemeName", from_ext(THEME_EXTENSION, "parentThemeName"))?;
                slots.set_default(
                    "parentThemeProjectName",
                    from_ext(THEME_EXTENSION, "parentThemeProjectName"),
                )?;
                slots.set_default("themeType", from_ext(THEME_EXTENSION, "themeType"))?;
                slots.set_default("diffsDir", from_ext(THEME_EXTENSION, "diffsDir"))?;
                slots.set_default("outputDir", from_ext(WAR_EXTENSION, "webAppDir"))?;
                slots.set_default("appServerPortalDir", from_ext(LIFERAY_EXTENSION, "appServerPortalDir"))?;
            }
            Ok(())
        })?;
        project.after_evaluate("buildThumbnail defaults", |_, graph| {
            for task in graph.tasks_of_kind_mut(THUMBNAIL_TASK) {
                let slots = &mut task.slots;
                slots.set_default("classpath", from_ext(LIFERAY_EXTENSION, "portalClasspath"))?;
                slots.set_default("javaExecutable", from_ext(LIFERAY_EXTENSION, "javaExecutable"))?;
                slots.set_default("diffsDir", from_ext(THEME_EXTENSION, "diffsDir"))?;
                slots.set_default(
                    "originalFile",
                    under_ext(THEME_EXTENSION, "diffsDir", "images/screenshot.png"),
                )?;
                slots.set_default(
                    "thumbnailFile",
                    under_ext(WAR_EXTENSION, "webAppDir", "images/thumbnail.png"),
                )?;
                slots.set_default("height", |_| Ok(Value::Int(120)))?;
                slots.set_default("width", |_| Ok(Value::Int(160)))?;
                slots.set_default("overwrite", |_| Ok(Value::Bool(true)))?;
            }
            Ok(())
        })
    }
}

/// Read a string slot during validation, treating unset as absent
fn configured(slots: &Slots, name: &str) -> ConfigResult<Option<String>> {
    slots
        .opt_string(name)
        .map_err(|e| ConfigError::Invalid(e.to_string()))
}

fn parent_of(slots: &Slots) -> ConfigResult<ParentTheme> {
    let name = configured(slots, "parentThemeName")?;
    let project = configured(slots, "parentThemeProjectName")?;
    ParentTheme::select(name.as_deref(), project.as_deref())
}

fn theme_type_of(slots: &Slots) -> ConfigResult<ThemeType> {
    match configured(slots, "themeType")? {
        Some(theme_type) => theme_type.parse(),
        None => Ok(ThemeType::default()),
    }
}

pub fn merge_task(name: &str) -> Task {
    Task::new(name, MERGE_TASK)
        .with_description("Merges the theme diffs over the parent theme")
        .with_group("theme")
        .with_slot("parentThemeName")
        .with_slot("parentThemeProjectName")
        .with_slot("themeType")
        .with_slot("appServerPortalDir")
        .with_required_slot("diffsDir")
        .with_required_slot("outputDir")
        .with_validator(|slots| parent_of(slots).map(|_| ()))
        .with_validator(|slots| theme_type_of(slots).map(|_| ()))
        .with_action(merge)
}

fn merge(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let request = MergeRequest {
        parent: parent_of(ctx.slots())?,
        theme_type: theme_type_of(ctx.slots())?,
        portal_dir: ctx.opt_file("appServerPortalDir")?,
        diffs_dir: ctx.file("diffsDir")?,
        output_dir: ctx.file("outputDir")?,
    };
    merge_theme(&request, ctx.siblings())?;
    Ok(())
}

pub fn thumbnail_task(name: &str) -> Task {
    Task::new(name, THUMBNAIL_TASK)
        .with_description("Builds the theme thumbnail from its screenshot")
        .with_group("theme")
        .with_slot("classpath")
        .with_slot("javaExecutable")
        .with_slot("diffsDir")
        .with_required_slot("originalFile")
        .with_required_slot("thumbnailFile")
        .with_required_slot("height")
        .with_required_slot("width")
        .with_required_slot("overwrite")
        .depends_on(MERGE_TASK)
        .only_if(has_screenshot_without_thumbnail)
        .with_action(build_thumbnail)
}

/// The screenshot exists and the diffs do not ship a ready thumbnail
fn has_screenshot_without_thumbnail(ctx: &TaskContext<'_>) -> bool {
    let Ok(original) = ctx.file("originalFile") else {
        return false;
    };
    let shipped = match ctx.opt_file("diffsDir") {
        Ok(Some(diffs)) => diffs.join("images").join("thumbnail.png").exists(),
        _ => false,
    };
    original.is_file() && !shipped
}

/// The generator call for one thumbnail
pub fn thumbnail_invocation(ctx: &TaskContext<'_>) -> ExecutionResult<Invocation> {
    let height = ctx.int("height")?;
    let width = ctx.int("width")?;
    if height <= 0 {
        return Err(ExecutionError::invalid("height", format!("must be positive, got {}", height)));
    }
    if width <= 0 {
        return Err(ExecutionError::invalid("width", format!("must be positive, got {}", width)));
    }

    Ok(Invocation::new(THUMBNAIL_BUILDER, ctx.project_dir())
        .with_classpath(classpath(ctx)?)
        .arg("thumbnail.original.file", ctx.file("originalFile")?.display())
        .arg("thumbnail.thumbnail.file", ctx.file("thumbnailFile")?.display())
        .arg("thumbnail.height", height)
        .arg("thumbnail.width", width)
        .arg("thumbnail.overwrite", ctx.boolean("overwrite")?))
}

fn build_thumbnail(ctx: &TaskContext<'_>) -> ExecutionResult<()> {
    let invocation = thumbnail_invocation(ctx)?;
    java_invoker(ctx)?.run(&invocation)?;
    info!(thumbnail = %ctx.file("thumbnailFile")?.display(), "thumbnail built");
    Ok(())
}
