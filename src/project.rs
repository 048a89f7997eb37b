//! Project discovery: root directory, name, host sources and the override file.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::OVERRIDE_FILE;

/// File name suffix of JSON host documents.
pub const HOST_DOCUMENT_SUFFIX: &str = ".types.json";

const PROJECT_EXTENSIONS: &[&str] = &["csproj", "vbproj", "fsproj"];
const SKIPPED_DIRS: &[&str] = &["bin", "obj", "node_modules"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
    name: String,
}

impl Project {
    /// A project rooted at `root` (canonicalized when it exists), named after
    /// its project file when there is one, else after the directory.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = fs::canonicalize(&root).unwrap_or(root);
        let name = project_file(&root)
            .and_then(|file| file.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .or_else(|| root.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_default();
        Self { root, name }
    }

    /// The nearest ancestor of `path` holding a project file; the containing
    /// directory itself when none does.
    pub fn discover(path: &Path) -> Self {
        let start = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        let root = start
            .ancestors()
            .find(|dir| project_file(dir).is_some())
            .unwrap_or(start);
        Self::at(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Files the project contributes types from, sorted by path: C# sources
    /// and JSON host documents.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.walk()
            .filter(|entry| is_source(entry.path()))
            .map(DirEntry::into_path)
            .collect()
    }

    /// First `tsdefgen.json` under the root, matched case-insensitively.
    pub fn find_override(&self) -> Option<PathBuf> {
        self.walk()
            .find(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.eq_ignore_ascii_case(OVERRIDE_FILE))
            })
            .map(DirEntry::into_path)
    }

    fn walk(&self) -> impl Iterator<Item = DirEntry> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
    }
}

pub fn is_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name.ends_with(".cs") || name.ends_with(HOST_DOCUMENT_SUFFIX)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.iter().any(|skip| name.eq_ignore_ascii_case(skip))
}

fn project_file(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PROJECT_EXTENSIONS.contains(&ext))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
