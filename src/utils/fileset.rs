//! Ant-style file sets
//!
//! A file set is a base directory plus include and exclude patterns. `*`
//! matches within one path segment, `**` across segments, and a pattern
//! ending in `/` matches everything below that directory.

use crate::error::{ExecutionError, ExecutionResult};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Patterns excluded from every file set
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/.svn/**",
    "**/CVS/**",
    "**/.DS_Store",
    "**/*~",
    "**/#*#",
];

/// A directory with include and exclude patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    pub dir: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl FileSet {
    /// Every file below `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileSet {
            dir: dir.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
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

    /// Relative paths of the matching files, sorted
    pub fn files(&self) -> ExecutionResult<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(ExecutionError::invalid(
                "fileset",
                format!("'{}' is not a directory", self.dir.display()),
            ));
        }

        let includes = if self.includes.is_empty() {
            None
        } else {
            Some(build_set(&self.includes)?)
        };
        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        excludes.extend(self.excludes.iter().cloned());
        let excludes = build_set(&excludes)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                ExecutionError::invalid("fileset", format!("directory walk error: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = match entry.path().strip_prefix(&self.dir) {
                Ok(relative) => relative.to_path_buf(),
                Err(_) => continue,
            };
            let included = includes.as_ref().map_or(true, |set| set.is_match(&relative));
            if included && !excludes.is_match(&relative) {
                files.push(relative);
            }
        }
        Ok(files)
    }
}

fn build_set(patterns: &[String]) -> ExecutionResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder
        .build()
        .map_err(|e| ExecutionError::invalid("fileset", e.to_string()))
}

fn compile(pattern: &str) -> ExecutionResult<Glob> {
    let normalized = pattern.replace('\\', "/");
    let normalized = if normalized.ends_with('/') {
        format!("{}**", normalized)
    } else {
        normalized
    };
    GlobBuilder::new(&normalized)
        .literal_separator(true)
        .build()
        .map_err(|e| ExecutionError::invalid("fileset", format!("bad pattern '{}': {}", pattern, e)))
}

/// Copy the files of a set below `to_dir`, keeping relative paths
///
/// Without `overwrite`, an existing target is only replaced when the source
/// is newer. Returns the relative paths that were written.
pub fn copy_fileset(set: &FileSet, to_dir: &Path, overwrite: bool) -> ExecutionResult<Vec<PathBuf>> {
    let mut copied = Vec::new();
    for relative in set.files()? {
        let source = set.dir.join(&relative);
        let target = to_dir.join(&relative);
        if !overwrite && !is_newer(&source, &target)? {
            continue;
        }
        copy_file(&source, &target)?;
        copied.push(relative);
    }
    debug!(from = %set.dir.display(), to = %to_dir.display(), files = copied.len(), "copied file set");
    Ok(copied)
}

/// Copy one file, creating parent directories
pub fn copy_file(source: &Path, target: &Path) -> ExecutionResult<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)?;
    Ok(())
}

fn is_newer(source: &Path, target: &Path) -> ExecutionResult<bool> {
    if !target.exists() {
        return Ok(true);
    }
    let source_time = fs::metadata(source)?.modified()?;
    let target_time = fs::metadata(target)?.modified()?;
    Ok(source_time > target_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file).unwrap();
        }
        dir
    }

    fn names(files: Vec<PathBuf>) -> Vec<String> {
        files
            .into_iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_all_files_by_default() {
        let dir = tree(&["css/main.css", "images/logo.png", "templates/portal_normal.vm"]);
        let files = FileSet::new(dir.path()).files().unwrap();
        assert_eq!(
            names(files),
            vec!["css/main.css", "images/logo.png", "templates/portal_normal.vm"]
        );
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let dir = tree(&["templates/init.vm", "templates/portal_normal.vm", "templates/sub/nav.vm"]);
        let files = FileSet::new(dir.path().join("templates"))
            .include("*.vm")
            .exclude("init.vm")
            .files()
            .unwrap();
        assert_eq!(names(files), vec!["portal_normal.vm"]);
    }

    #[test]
    fn test_double_star_and_trailing_slash() {
        let dir = tree(&["_diffs/css/custom.css", "css/main.css", "templates/a.vm"]);
        let files = FileSet::new(dir.path())
            .exclude("_diffs/**")
            .exclude("templates/")
            .files()
            .unwrap();
        assert_eq!(names(files), vec!["css/main.css"]);
    }

    #[test]
    fn test_default_excludes() {
        let dir = tree(&[".git/config", "css/main.css", "css/main.css~"]);
        let files = FileSet::new(dir.path()).files().unwrap();
        assert_eq!(names(files), vec!["css/main.css"]);
    }

    #[test]
    fn test_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = FileSet::new(dir.path().join("nope")).files();
        assert!(matches!(result, Err(ExecutionError::InvalidPropertyValue { .. })));
    }

    #[test]
    fn test_copy_overwrites_when_asked() {
        let source = tree(&["css/main.css"]);
        let target = TempDir::new().unwrap();
        fs::create_dir_all(target.path().join("css")).unwrap();
        fs::write(target.path().join("css/main.css"), "old").unwrap();

        let copied = copy_fileset(&FileSet::new(source.path()), target.path(), true).unwrap();

        assert_eq!(names(copied), vec!["css/main.css"]);
        assert_eq!(
            fs::read_to_string(target.path().join("css/main.css")).unwrap(),
            "css/main.css"
        );
    }
}
