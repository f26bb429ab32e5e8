//! Core configuration types
//!
//! This module defines the data structures that represent a plugbuild.yml
//! project file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settings of one section, keyed by kebab-case (or camelCase) slot name
pub type Settings = BTreeMap<String, SettingValue>;

/// Top-level project file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    /// Project name (defaults to the directory name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Plugins to apply, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    /// Shell used for commands (e.g., ["bash", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Portal installation settings
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub liferay: Settings,

    /// Theme settings
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub theme: Settings,

    /// Service builder settings
    #[serde(
        rename = "service-builder",
        default,
        skip_serializing_if = "Settings::is_empty"
    )]
    pub service_builder: Settings,

    /// Web application layout
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub war: Settings,

    /// How the web archive is packaged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<Package>,

    /// Member project directories; makes this file a workspace
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,

    /// Task overrides and custom tasks
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tasks: BTreeMap<String, TaskConfig>,
}

/// Packaging command of the `war` task
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Package {
    pub command: String,
}

/// Configuration of one task
///
/// For a task a plugin already defines, this overrides settings and adds
/// dependencies and conditions. Any other name defines a new task: either a
/// task of a registered `type` or a shell task with `run` commands.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Description shown by `--list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Group shown by `--list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Registered task type of a new task (e.g. `mergeTheme`)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Explicit slot values
    #[serde(default, skip_serializing_if = "Settings::is_empty")]
    pub settings: Settings,

    /// Extra upstream tasks
    #[serde(
        rename = "depends-on",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub depends_on: Vec<String>,

    /// Extra conditions; all must hold
    #[serde(rename = "only-if", default, skip_serializing_if = "Vec::is_empty")]
    pub only_if: Vec<When>,

    /// Shell commands of a custom task
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub run: Vec<String>,
}

/// A conditional expression
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct When {
    /// Check if values are equal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal: Option<WhenComparison>,

    /// Check if values are not equal
    #[serde(rename = "not-equal", default, skip_serializing_if = "Option::is_none")]
    pub not_equal: Option<WhenComparison>,

    /// Check if a command succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Check if a path exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,

    /// Check if a path does not exist
    #[serde(rename = "not-exists", default, skip_serializing_if = "Option::is_none")]
    pub not_exists: Option<String>,

    /// Check if environment variable is set
    #[serde(rename = "env-set", default, skip_serializing_if = "Option::is_none")]
    pub env_set: Option<String>,

    /// Check if environment variable is not set
    #[serde(rename = "env-not-set", default, skip_serializing_if = "Option::is_none")]
    pub env_not_set: Option<String>,
}

/// A comparison for when conditions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WhenComparison {
    /// Left-hand side of comparison
    pub left: String,

    /// Right-hand side of comparison
    pub right: String,
}

/// A scalar or list setting
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

/// User-level defaults shared by every project
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserDefaults {
    #[serde(default)]
    pub liferay: Settings,
}

/// Accept either a single string or a list of strings
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => {
            let mut items = Vec::new();
            for item in seq {
                let item = String::deserialize(item).map_err(D::Error::custom)?;
                items.push(item);
            }
            Ok(items)
        }
        // Null or not present
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}
