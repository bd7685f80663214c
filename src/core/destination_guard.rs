use crate::utils::error::{Result, ScaffoldError};
use std::fs;
use std::path::Path;

/// Incidental files a fresh directory may already hold: VCS, OS and editor
/// metadata, plus license and readme files.
pub const ALLOWED_FILES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    ".git",
    ".gitattributes",
    ".gitignore",
    ".idea",
    ".vscode",
    "README.md",
    "LICENSE",
    "LICENSE.md",
];

pub fn default_allowed_files() -> Vec<String> {
    ALLOWED_FILES.iter().map(|n| n.to_string()).collect()
}

/// Creates `root` and its parents. No error if it already is a directory.
pub fn ensure_exists(root: &Path) -> Result<()> {
    fs::create_dir_all(root).map_err(ScaffoldError::io_at(root))
}

/// Names of the immediate children of `root` that are not allow-listed, sorted.
pub fn conflicting_entries(root: &Path, allowed: &[String]) -> Result<Vec<String>> {
    let mut conflicts = Vec::new();
    for entry in fs::read_dir(root).map_err(ScaffoldError::io_at(root))? {
        let entry = entry.map_err(ScaffoldError::io_at(root))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !allowed.iter().any(|a| *a == name) {
            conflicts.push(name);
        }
    }
    conflicts.sort();
    Ok(conflicts)
}

pub fn is_safe_to_scaffold(root: &Path, allowed: &[String]) -> Result<bool> {
    Ok(conflicting_entries(root, allowed)?.is_empty())
}
