use crate::utils::error::{Result, ScaffoldError};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

/// Directory names that belong to a version-control system's internals.
pub const VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// File and byte totals of a copied or inspected tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    pub files: usize,
    pub bytes: u64,
}

pub fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).map_err(ScaffoldError::io_at(path))?;
    Ok(entries.next().is_none())
}

/// Moves `from` to `to` by rename.
///
/// Falls back to copy, verify and delete only when the rename crosses a
/// filesystem boundary. The source is removed only after the copy matches it.
pub fn move_path(from: &Path, to: &Path) -> Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                "Rename {} -> {} crosses filesystems, copying instead",
                from.display(),
                to.display()
            );
            copy_verify_remove(from, to).map(|_| ())
        }
        Err(e) => Err(ScaffoldError::io_at(from)(e)),
    }
}

/// Copies `from` to `to`, checks the copy against the source's totals and only
/// then deletes the source. On a mismatch the source is left in place.
pub(crate) fn copy_verify_remove(from: &Path, to: &Path) -> Result<TreeSummary> {
    let copied = copy_tree(from, to, &[])?;
    let landed = summarize_tree(to, &[])?;
    if copied != landed {
        return Err(ScaffoldError::io_at(to)(io::Error::other(format!(
            "copy incomplete: expected {} files/{} bytes, found {} files/{} bytes",
            copied.files, copied.bytes, landed.files, landed.bytes
        ))));
    }
    if from.is_dir() {
        fs::remove_dir_all(from).map_err(ScaffoldError::io_at(from))?;
    } else {
        fs::remove_file(from).map_err(ScaffoldError::io_at(from))?;
    }
    Ok(landed)
}

/// Recursively copies `from` into `to`, skipping any directory named in `skip`.
pub fn copy_tree(from: &Path, to: &Path, skip: &[&str]) -> Result<TreeSummary> {
    copy_tree_until(from, to, skip, &AtomicBool::new(false))
}

/// Like [`copy_tree`], but gives up with `Interrupted` once `stop` is raised.
pub fn copy_tree_until(
    from: &Path,
    to: &Path,
    skip: &[&str],
    stop: &AtomicBool,
) -> Result<TreeSummary> {
    let mut summary = TreeSummary::default();

    if from.is_file() {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(ScaffoldError::io_at(parent))?;
        }
        summary.bytes = fs::copy(from, to).map_err(ScaffoldError::io_at(from))?;
        summary.files = 1;
        return Ok(summary);
    }

    let walker = WalkDir::new(from)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, skip));

    for entry in walker {
        if stop.load(Ordering::SeqCst) {
            return Err(ScaffoldError::io_at(to)(io::Error::new(
                io::ErrorKind::Interrupted,
                "copy stopped before completion",
            )));
        }
        let entry = entry.map_err(|e| walk_error(from, e))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| ScaffoldError::io_at(entry.path())(io::Error::other(e)))?;
        let dest = to.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(ScaffoldError::io_at(&dest))?;
        } else if file_type.is_file() {
            summary.bytes += fs::copy(entry.path(), &dest).map_err(ScaffoldError::io_at(&dest))?;
            summary.files += 1;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &dest)?;
        }
    }

    Ok(summary)
}

/// Counts regular files and their total size under `root`.
pub fn summarize_tree(root: &Path, skip: &[&str]) -> Result<TreeSummary> {
    let mut summary = TreeSummary::default();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e, skip));

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_file() {
            let metadata = entry
                .metadata()
                .map_err(|e| walk_error(entry.path(), e))?;
            summary.files += 1;
            summary.bytes += metadata.len();
        }
    }

    Ok(summary)
}

fn is_skipped(entry: &walkdir::DirEntry, skip: &[&str]) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| skip.contains(&name))
}

pub(crate) fn walk_error(root: &Path, err: walkdir::Error) -> ScaffoldError {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
    ScaffoldError::Io { path, source }
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from).map_err(ScaffoldError::io_at(from))?;
    std::os::unix::fs::symlink(target, to).map_err(ScaffoldError::io_at(to))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, _to: &Path) -> Result<()> {
    tracing::warn!("Skipping symbolic link {}", from.display());
    Ok(())
}
