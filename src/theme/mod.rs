//! Theme merging
//!
//! A theme is built by layering a base theme shipped with the portal (or the
//! merged output of another theme project) under the theme's own diffs.

pub mod merge;

pub use merge::{layers_for, merge_theme, MergeReport, MergeRequest, ThemeLayer, MERGE_TASK};

use crate::error::{ConfigError, ConfigResult};
use std::fmt;
use std::str::FromStr;

/// Template language of a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeType {
    #[default]
    Vm,
    Ftl,
}

impl ThemeType {
    /// File extension of the templates
    pub fn extension(self) -> &'static str {
        match self {
            ThemeType::Vm => "vm",
            ThemeType::Ftl => "ftl",
        }
    }
}

impl FromStr for ThemeType {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s {
            "vm" => Ok(ThemeType::Vm),
            "ftl" => Ok(ThemeType::Ftl),
            other => Err(ConfigError::Invalid(format!(
                "theme type must be 'vm' or 'ftl', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ThemeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// What a theme inherits from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentTheme {
    Unstyled,
    Styled,
    Classic,
    /// A name the portal does not ship; only the diffs are copied
    Unrecognized(String),
    /// Another theme project of the workspace
    Project(String),
}

impl ParentTheme {
    /// Pick the parent from the two mutually exclusive settings
    pub fn select(name: Option<&str>, project: Option<&str>) -> ConfigResult<Self> {
        match (name, project) {
            (Some(_), Some(_)) => Err(ConfigError::MutuallyExclusiveConfiguration {
                first: "parentThemeName".to_string(),
                second: "parentThemeProjectName".to_string(),
            }),
            (None, None) => Err(ConfigError::MissingRequiredProperty {
                owner: "mergeTheme".to_string(),
                slot: "parentThemeName".to_string(),
            }),
            (None, Some(project)) => Ok(ParentTheme::Project(project.to_string())),
            (Some("_unstyled"), None) => Ok(ParentTheme::Unstyled),
            (Some("_styled"), None) => Ok(ParentTheme::Styled),
            (Some("classic"), None) => Ok(ParentTheme::Classic),
            (Some(other), None) => Ok(ParentTheme::Unrecognized(other.to_string())),
        }
    }

    /// Whether the parent comes from the portal installation
    pub fn needs_portal(&self) -> bool {
        matches!(self, ParentTheme::Unstyled | ParentTheme::Styled | ParentTheme::Classic)
    }
}
