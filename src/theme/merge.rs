//! Layered theme merge

use crate::engine::workspace::SiblingProjects;
use crate::error::{ConfigError, ExecutionError, ExecutionResult};
use crate::theme::{ParentTheme, ThemeType};
use crate::utils::{copy_fileset, FileSet};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

/// Task a sibling theme project must run before it can be inherited from
pub const MERGE_TASK: &str = "mergeTheme";

/// One copy step of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeLayer {
    pub source_dir: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Destination below the output directory; empty for the output root
    pub dest_subdir: PathBuf,
}

impl ThemeLayer {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        ThemeLayer {
            source_dir: source_dir.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
            dest_subdir: PathBuf::new(),
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn into_subdir(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest_subdir = dest.into();
        self
    }

    /// Where the layer lands; absolute or escaping destinations are rejected
    pub fn destination(&self, output_dir: &Path) -> ExecutionResult<PathBuf> {
        let escapes = self
            .dest_subdir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ExecutionError::invalid(
                "destSubdir",
                format!(
                    "'{}' must be a relative path inside the output directory",
                    self.dest_subdir.display()
                ),
            ));
        }
        Ok(output_dir.join(&self.dest_subdir))
    }

    fn check_source(&self) -> ExecutionResult<()> {
        if !self.source_dir.is_dir() {
            return Err(ExecutionError::invalid(
                "sourceDir",
                format!("theme layer '{}' does not exist", self.source_dir.display()),
            ));
        }
        Ok(())
    }

    /// Copy the layer over the output, overwriting; returns written paths relative to the output
    pub fn apply(&self, output_dir: &Path) -> ExecutionResult<Vec<PathBuf>> {
        let destination = self.destination(output_dir)?;
        let set = FileSet {
            dir: self.source_dir.clone(),
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
        };
        let copied = copy_fileset(&set, &destination, true)?;
        Ok(copied
            .into_iter()
            .map(|relative| self.dest_subdir.join(relative))
            .collect())
    }
}

/// Inputs of one merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub parent: ParentTheme,
    pub theme_type: ThemeType,
    /// Portal web application root; needed for portal-shipped parents
    pub portal_dir: Option<PathBuf>,
    pub diffs_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// What a merge wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub parent: ParentTheme,
    pub layers: usize,
    /// Distinct output files, relative to the output directory
    pub files: BTreeSet<PathBuf>,
}

/// Base layers for a portal-shipped parent, in application order
pub fn layers_for(
    parent: &ParentTheme,
    theme_type: ThemeType,
    portal_dir: &Path,
) -> Vec<ThemeLayer> {
    let themes = portal_dir.join("html").join("themes");
    let templates = format!("*.{}", theme_type.extension());

    let unstyled = || {
        vec![
            ThemeLayer::new(themes.join("_unstyled")).exclude("templates/**"),
            ThemeLayer::new(themes.join("_unstyled").join("templates"))
                .include(templates.clone())
                .exclude(format!("init.{}", theme_type.extension()))
                .into_subdir("templates"),
        ]
    };

    match parent {
        ParentTheme::Unstyled => unstyled(),
        ParentTheme::Styled => {
            let mut layers = unstyled();
            layers.push(ThemeLayer::new(themes.join("_styled")));
            layers
        }
        ParentTheme::Classic => vec![
            ThemeLayer::new(themes.join("classic"))
                .exclude("_diffs/**")
                .exclude("templates/**"),
            ThemeLayer::new(themes.join("classic").join("templates"))
                .include(templates)
                .into_subdir("templates"),
        ],
        ParentTheme::Unrecognized(_) | ParentTheme::Project(_) => Vec::new(),
    }
}

/// Build the theme output tree
///
/// Everything is validated before the first file is written. A sibling
/// parent is built through `siblings` first and its output copied without
/// `WEB-INF`. The diffs always go last.
pub fn merge_theme(
    request: &MergeRequest,
    siblings: &dyn SiblingProjects,
) -> ExecutionResult<MergeReport> {
    let mut layers = if request.parent.needs_portal() {
        let portal_dir = request.portal_dir.as_ref().ok_or_else(|| {
            ExecutionError::from(ConfigError::MissingRequiredProperty {
                owner: MERGE_TASK.to_string(),
                slot: "appServerPortalDir".to_string(),
            })
        })?;
        layers_for(&request.parent, request.theme_type, portal_dir)
    } else {
        Vec::new()
    };

    if let ParentTheme::Unrecognized(name) = &request.parent {
        warn!(parent = %name, "unrecognized parent theme, copying diffs only");
    }

    let diffs = ThemeLayer::new(&request.diffs_dir);
    for layer in layers.iter().chain(std::iter::once(&diffs)) {
        layer.check_source()?;
        layer.destination(&request.output_dir)?;
    }

    if let ParentTheme::Project(project) = &request.parent {
        info!(sibling = %project, "building parent theme project");
        let sibling_output = siblings.build_sibling(project, MERGE_TASK, "outputDir")?;
        let layer = ThemeLayer::new(sibling_output).exclude("WEB-INF/**");
        layer.check_source()?;
        layers.push(layer);
    }
    layers.push(diffs);

    std::fs::create_dir_all(&request.output_dir)?;
    let mut files = BTreeSet::new();
    for layer in &layers {
        files.extend(layer.apply(&request.output_dir)?);
    }

    info!(
        output = %request.output_dir.display(),
        layers = layers.len(),
        files = files.len(),
        "theme merged"
    );
    Ok(MergeReport {
        parent: request.parent.clone(),
        layers: layers.len(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::workspace::NoSiblings;

    #[test]
    fn test_destination_rejects_escape() {
        let layer = ThemeLayer::new("/portal").into_subdir("../outside");
        assert!(matches!(
            layer.destination(Path::new("/out")),
            Err(ExecutionError::InvalidPropertyValue { .. })
        ));

        let layer = ThemeLayer::new("/portal").into_subdir("/abs");
        assert!(layer.destination(Path::new("/out")).is_err());

        let layer = ThemeLayer::new("/portal").into_subdir("templates");
        assert_eq!(
            layer.destination(Path::new("/out")).unwrap(),
            PathBuf::from("/out/templates")
        );
    }

    #[test]
    fn test_styled_layers_extend_unstyled() {
        let portal = Path::new("/portal");
        let unstyled = layers_for(&ParentTheme::Unstyled, ThemeType::Vm, portal);
        let styled = layers_for(&ParentTheme::Styled, ThemeType::Vm, portal);

        assert_eq!(unstyled.len(), 2);
        assert_eq!(&styled[..2], &unstyled[..]);
        assert_eq!(styled[2].source_dir, PathBuf::from("/portal/html/themes/_styled"));
        assert_eq!(unstyled[1].excludes, vec!["init.vm"]);
    }

    #[test]
    fn test_classic_ftl_layers() {
        let layers = layers_for(&ParentTheme::Classic, ThemeType::Ftl, Path::new("/portal"));
        assert_eq!(layers[0].excludes, vec!["_diffs/**", "templates/**"]);
        assert_eq!(layers[1].includes, vec!["*.ftl"]);
        assert_eq!(layers[1].dest_subdir, PathBuf::from("templates"));
    }

    #[test]
    fn test_preset_parent_requires_portal() {
        let request = MergeRequest {
            parent: ParentTheme::Classic,
            theme_type: ThemeType::Vm,
            portal_dir: None,
            diffs_dir: PathBuf::from("/diffs"),
            output_dir: PathBuf::from("/out"),
        };
        let result = merge_theme(&request, &NoSiblings);
        assert!(matches!(
            result,
            Err(ExecutionError::Configuration(ConfigError::MissingRequiredProperty { ref slot, .. })) if slot == "appServerPortalDir"
        ));
    }
}
