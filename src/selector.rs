//! File selection.
//!
//! Walks a root directory depth-first and yields every file whose
//! extension (or exact file name) is allow-listed, pruning directories whose
//! name is deny-listed. Both lists live in an immutable [`SelectorConfig`]
//! handed to [`FileSelector::new`], so callers and tests can replace them.
//!
//! Traversal is fail-fast: the first directory that cannot be listed aborts
//! the walk with [`SyncError::FileSystem`] and no partial list is returned.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::error::SyncError;
use crate::models::FilePath;

#[rustfmt::skip]
const DEFAULT_EXTENSIONS: &[&str] = &[
    // source and scripts
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rb", "go", "rs", "java", "kt",
    "sh", "bash", "zsh", "ps1",
    // docs
    "md", "mdx",
    // infrastructure as code
    "tf", "tfvars", "hcl", "yaml", "yml",
    // containers
    "dockerfile",
];

const DEFAULT_FILE_NAMES: &[&str] = &["Dockerfile", ".dockerignore"];

const DEFAULT_DENY_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "vendor",
    ".venv",
    "venv",
    "__pycache__",
    ".terraform",
    "dist",
    "build",
    "out",
    "target",
    ".next",
    "coverage",
    ".cache",
    "logs",
    "tmp",
    "temp",
];

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_extensions() -> BTreeSet<String> {
    to_set(DEFAULT_EXTENSIONS)
}
fn default_file_names() -> BTreeSet<String> {
    to_set(DEFAULT_FILE_NAMES)
}
fn default_deny_dirs() -> BTreeSet<String> {
    to_set(DEFAULT_DENY_DIRS)
}

/// Which files the selector reports.
#[derive(Debug, Deserialize, Clone)]
pub struct SelectorConfig {
    /// Allowed extensions, without the leading dot. Matched case-insensitively.
    #[serde(default = "default_extensions")]
    pub extensions: BTreeSet<String>,
    /// Allowed exact file names, for files without a usable extension.
    #[serde(default = "default_file_names")]
    pub file_names: BTreeSet<String>,
    /// Directory names that are never descended into, at any depth.
    #[serde(default = "default_deny_dirs")]
    pub deny_dirs: BTreeSet<String>,
    /// Extra glob patterns, relative to the root, for files to skip.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            file_names: default_file_names(),
            deny_dirs: default_deny_dirs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

/// Enumerates eligible files under a root directory.
pub struct FileSelector {
    extensions: BTreeSet<String>,
    file_names: BTreeSet<String>,
    deny_dirs: BTreeSet<String>,
    excludes: GlobSet,
    follow_symlinks: bool,
}

impl FileSelector {
    pub fn new(config: SelectorConfig) -> Result<Self, SyncError> {
        let extensions = config
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        let excludes = build_globset(&config.exclude_globs)?;
        Ok(Self {
            extensions,
            file_names: config.file_names,
            deny_dirs: config.deny_dirs,
            excludes,
            follow_symlinks: config.follow_symlinks,
        })
    }

    /// Walk `root` and return the selected files as absolute paths.
    ///
    /// Entries are visited in file-name order so repeated calls over an
    /// unchanged tree return the same sequence.
    pub fn select(&self, root: &Path) -> Result<Vec<FilePath>, SyncError> {
        let root = std::fs::canonicalize(root).map_err(|source| SyncError::FileSystem {
            path: root.to_path_buf(),
            source,
        })?;

        let walker = WalkDir::new(&root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_denied_dir(e));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|err| walk_error(err, &root))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.is_allowed(path) {
                continue;
            }

            let relative = path.strip_prefix(&root).unwrap_or(path);
            if self.excludes.is_match(relative) {
                continue;
            }

            let resolved = if self.follow_symlinks {
                std::fs::canonicalize(path).map_err(|source| SyncError::FileSystem {
                    path: path.to_path_buf(),
                    source,
                })?
            } else {
                path.to_path_buf()
            };
            files.push(FilePath::new(resolved));
        }

        debug!(root = %root.display(), count = files.len(), "selected files");
        Ok(files)
    }

    fn is_denied_dir(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.deny_dirs.contains(name))
    }

    /// Inclusion depends only on the name, never on content or size.
    ///
    /// File names must match exactly. Extensions are compared
    /// case-insensitively, so `compose.YAML` is allowed by `yaml`.
    fn is_allowed(&self, path: &Path) -> bool {
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.file_names.contains(name));
        if by_name {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

/// Run `vecsync scan`: print the files a sync of `root` would ingest.
pub fn run_scan(config: &Config, root: &Path) -> anyhow::Result<()> {
    let files = FileSelector::new(config.selector.clone())?.select(root)?;
    for file in &files {
        println!("{}", file);
    }
    println!("files: {}", files.len());
    Ok(())
}

fn walk_error(err: walkdir::Error, root: &Path) -> SyncError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(root));
    SyncError::FileSystem {
        path,
        source: err.into(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, SyncError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    fn selected_names(root: &Path, config: SelectorConfig) -> Vec<String> {
        let canonical = fs::canonicalize(root).unwrap();
        FileSelector::new(config)
            .unwrap()
            .select(root)
            .unwrap()
            .iter()
            .map(|p| {
                p.as_path()
                    .strip_prefix(&canonical)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn selects_allowed_and_skips_denied_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.ts");
        touch(tmp.path(), "b.png");
        touch(tmp.path(), "node_modules/c.ts");

        let files = selected_names(tmp.path(), SelectorConfig::default());
        assert_eq!(files, vec!["a.ts"]);
    }

    #[test]
    fn denied_dirs_are_pruned_at_any_depth() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/lib.rs");
        touch(tmp.path(), "src/deep/.git/hooks/pre-commit.sh");
        touch(tmp.path(), "packages/web/dist/bundle.js");
        touch(tmp.path(), "packages/web/index.js");

        let files = selected_names(tmp.path(), SelectorConfig::default());
        assert_eq!(files, vec!["packages/web/index.js", "src/lib.rs"]);
    }

    #[test]
    fn output_is_absolute_and_stable() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "z.md");
        touch(tmp.path(), "a.md");
        touch(tmp.path(), "m/infra.tf");

        let selector = FileSelector::new(SelectorConfig::default()).unwrap();
        let first = selector.select(tmp.path()).unwrap();
        let second = selector.select(tmp.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.iter().all(|p| p.as_path().is_absolute()));
    }

    #[test]
    fn container_files_match_by_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Dockerfile");
        touch(tmp.path(), ".dockerignore");
        touch(tmp.path(), "Makefile");
        touch(tmp.path(), "deploy/compose.YAML");

        let files = selected_names(tmp.path(), SelectorConfig::default());
        assert_eq!(files, vec![".dockerignore", "Dockerfile", "deploy/compose.YAML"]);
    }

    #[test]
    fn inclusion_ignores_content_and_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.py"), "").unwrap();
        fs::write(tmp.path().join("large.py"), "x".repeat(1 << 20)).unwrap();
        fs::write(tmp.path().join("notes.txt"), "print('hi')").unwrap();

        let files = selected_names(tmp.path(), SelectorConfig::default());
        assert_eq!(files, vec!["empty.py", "large.py"]);
    }

    #[test]
    fn config_overrides_replace_defaults() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.ts");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "node_modules/pkg/readme.txt");
        touch(tmp.path(), "private/secret.txt");

        let config = SelectorConfig {
            extensions: to_set(&[".TXT"]),
            file_names: BTreeSet::new(),
            deny_dirs: to_set(&["private"]),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        };
        let files = selected_names(tmp.path(), config);
        assert_eq!(files, vec!["node_modules/pkg/readme.txt", "notes.txt"]);
    }

    #[test]
    fn exclude_globs_skip_matching_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/app.ts");
        touch(tmp.path(), "src/app.test.ts");

        let config = SelectorConfig {
            exclude_globs: vec!["**/*.test.ts".to_string()],
            ..SelectorConfig::default()
        };
        let files = selected_names(tmp.path(), config);
        assert_eq!(files, vec!["src/app.ts"]);
    }

    #[test]
    fn root_named_like_denied_dir_is_still_walked() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "build/script.sh");

        let files = selected_names(&tmp.path().join("build"), SelectorConfig::default());
        assert_eq!(files, vec!["script.sh"]);
    }

    #[test]
    fn missing_root_is_a_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let selector = FileSelector::new(SelectorConfig::default()).unwrap();
        let err = selector.select(&tmp.path().join("absent")).unwrap_err();
        assert!(matches!(err, SyncError::FileSystem { .. }));
    }

    #[test]
    fn invalid_exclude_glob_is_rejected() {
        let config = SelectorConfig {
            exclude_globs: vec!["src/[".to_string()],
            ..SelectorConfig::default()
        };
        assert!(matches!(
            FileSelector::new(config),
            Err(SyncError::Pattern(_))
        ));
    }
}
