//! Relocates the placeholder package directories under every source root.
//!
//! Each root goes through an explicit move-then-prune sequence. Pruning only
//! ever removes empty directories one at a time, so anything the template
//! left next to the placeholder package survives.

use crate::domain::model::{RemapReport, SourceRoot};
use crate::utils::error::{Result, ScaffoldError};
use crate::utils::fs::{is_empty_dir, move_path};
use std::fs;
use std::path::{Path, PathBuf};

/// Source roots of the upstream boilerplates: the application and each module.
pub fn default_source_roots() -> Vec<SourceRoot> {
    let mut roots = vec![
        SourceRoot::required("src/main/java"),
        SourceRoot::optional("src/main/resources"),
    ];
    for module in ["api", "model", "service", "shared"] {
        roots.push(SourceRoot::optional(&format!("module/{}/src/main/java", module)));
        roots.push(SourceRoot::optional(&format!("module/{}/src/main/resources", module)));
    }
    roots
}

/// Moves `<root>/<source root>/<from>` to `<root>/<source root>/<to>` for every
/// declared source root, then prunes the vacated placeholder directories.
///
/// Roots that do not contain `from` are skipped, unless declared required, in
/// which case nothing is moved at all.
pub fn remap(root: &Path, source_roots: &[SourceRoot], from: &Path, to: &Path) -> Result<RemapReport> {
    for source_root in source_roots.iter().filter(|r| r.required) {
        let base = root.join(&source_root.path);
        if !base.join(from).is_dir() {
            return Err(ScaffoldError::MissingSourceRoot { root: base });
        }
    }

    let mut report = RemapReport::default();

    for source_root in source_roots {
        let base = root.join(&source_root.path);
        if !base.join(from).is_dir() {
            tracing::debug!("No {} under {}, skipping", from.display(), base.display());
            report.skipped.push(source_root.path.clone());
            continue;
        }

        if from != to {
            relocate(&base, from, to)?;
            if let Some(kept) = prune_vacated(&base, from, to)? {
                tracing::warn!(
                    "⚠️  {} still contains other files and was kept",
                    kept.display()
                );
                report.retained.push(kept);
            }
        }

        tracing::debug!(
            "Moved {} -> {} under {}",
            from.display(),
            to.display(),
            source_root.path.display()
        );
        report.remapped.push(source_root.path.clone());
    }

    Ok(report)
}

fn relocate(base: &Path, from: &Path, to: &Path) -> Result<()> {
    let source = base.join(from);
    let dest = base.join(to);

    // 衝突必須在搬移前偵測，否則原始碼會被留在暫存位置
    if let Ok(rest) = from.strip_prefix(to) {
        if !empties_once_moved(&dest, rest)? {
            return Err(ScaffoldError::PathCollision { path: dest });
        }
    } else if !to.starts_with(from) && dest.exists() && !is_removable_target(&dest)? {
        return Err(ScaffoldError::PathCollision { path: dest });
    }

    // Park the package beside the source root first so `to` may sit inside `from`.
    let parked = park_path(base);
    move_path(&source, &parked)?;

    if let Err(e) = place_parked(base, &parked, from, to) {
        restore_parked(&parked, &source);
        return Err(e);
    }
    Ok(())
}

fn place_parked(base: &Path, parked: &Path, from: &Path, to: &Path) -> Result<()> {
    let dest = base.join(to);

    if from.starts_with(to) {
        // `to` 是 `from` 的祖先：移除搬走後留下的空目錄鏈（含 dest）
        for ancestor in from.ancestors().skip(1) {
            let dir = base.join(ancestor);
            fs::remove_dir(&dir).map_err(ScaffoldError::io_at(&dir))?;
            if ancestor == to {
                break;
            }
        }
    } else if dest.exists() {
        if !is_removable_target(&dest)? {
            return Err(ScaffoldError::PathCollision { path: dest });
        }
        fs::remove_dir(&dest).map_err(ScaffoldError::io_at(&dest))?;
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(ScaffoldError::io_at(parent))?;
    }
    move_path(parked, &dest)
}

/// Puts a parked package back where it came from after a failed placement.
fn restore_parked(parked: &Path, source: &Path) {
    let restored = match source.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(ScaffoldError::io_at(parent)),
        None => Ok(()),
    }
    .and_then(|_| move_path(parked, source));

    if let Err(e) = restored {
        tracing::error!(
            "❌ Could not move {} back to {}: {}",
            parked.display(),
            source.display(),
            e
        );
    }
}

/// Whether `dir` is left empty once the entry at `dir/rest` moves away, i.e.
/// it holds nothing but the chain of directories leading to that entry.
fn empties_once_moved(dir: &Path, rest: &Path) -> Result<bool> {
    let mut components = rest.components();
    let Some(head) = components.next() else {
        return Ok(true);
    };
    let tail = components.as_path();

    for entry in fs::read_dir(dir).map_err(ScaffoldError::io_at(dir))? {
        let entry = entry.map_err(ScaffoldError::io_at(dir))?;
        if entry.file_name() != head.as_os_str() {
            return Ok(false);
        }
        if !tail.as_os_str().is_empty() && !empties_once_moved(&entry.path(), tail)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn is_removable_target(dest: &Path) -> Result<bool> {
    Ok(dest.is_dir() && is_empty_dir(dest)?)
}

fn park_path(base: &Path) -> PathBuf {
    let mut candidate = base.join(".package-remap");
    let mut attempt = 1;
    while candidate.exists() {
        candidate = base.join(format!(".package-remap-{}", attempt));
        attempt += 1;
    }
    candidate
}

/// Removes the now-empty ancestors of `from`, deepest first, up to its top
/// component. Stops at the first directory that still has children and
/// returns it, unless it only survives because it leads to `to`.
fn prune_vacated(base: &Path, from: &Path, to: &Path) -> Result<Option<PathBuf>> {
    for ancestor in from
        .ancestors()
        .skip(1)
        .take_while(|p| !p.as_os_str().is_empty())
    {
        let dir = base.join(ancestor);
        if !dir.is_dir() {
            continue;
        }
        if !is_empty_dir(&dir)? {
            return Ok((!to.starts_with(ancestor)).then_some(dir));
        }
        fs::remove_dir(&dir).map_err(ScaffoldError::io_at(&dir))?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn java_root() -> Vec<SourceRoot> {
        vec![SourceRoot::required("src/main/java")]
    }

    #[test]
    fn test_moves_to_deeper_package_and_prunes_placeholder() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        write(root, "src/main/java/wx/csba/web/Controller.java", "ctl");

        let report = remap(
            root,
            &java_root(),
            Path::new("wx/csba"),
            Path::new("com/acme/widget"),
        )
        .unwrap();

        let java = root.join("src/main/java");
        assert_eq!(fs::read_to_string(java.join("com/acme/widget/App.java")).unwrap(), "app");
        assert!(java.join("com/acme/widget/web/Controller.java").exists());
        assert!(!java.join("wx").exists());
        assert!(!java.join(".package-remap").exists());
        assert_eq!(report.remapped, vec![PathBuf::from("src/main/java")]);
        assert!(report.retained.is_empty());
    }

    #[test]
    fn test_moves_to_shallower_package() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/org/example/deep/App.java", "app");

        remap(root, &java_root(), Path::new("org/example/deep"), Path::new("demo")).unwrap();

        let java = root.join("src/main/java");
        assert!(java.join("demo/App.java").exists());
        assert!(!java.join("org").exists());
    }

    #[test]
    fn test_salted_placeholder_directory_is_kept() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/org/example/App.java", "app");
        write(root, "src/main/java/org/extra.txt", "keep me");

        let report = remap(
            root,
            &java_root(),
            Path::new("org/example"),
            Path::new("com/acme/widget"),
        )
        .unwrap();

        let java = root.join("src/main/java");
        assert!(java.join("com/acme/widget/App.java").exists());
        assert_eq!(fs::read_to_string(java.join("org/extra.txt")).unwrap(), "keep me");
        assert!(!java.join("org/example").exists());
        assert_eq!(report.retained, vec![java.join("org")]);
    }

    #[test]
    fn test_shared_prefix_keeps_common_parent() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");

        let report = remap(root, &java_root(), Path::new("wx/csba"), Path::new("wx/other")).unwrap();

        let java = root.join("src/main/java");
        assert!(java.join("wx/other/App.java").exists());
        assert!(!java.join("wx/csba").exists());
        assert!(report.retained.is_empty());
    }

    #[test]
    fn test_target_nested_inside_placeholder() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        write(root, "src/main/java/wx/csba/app/Inner.java", "inner");

        remap(root, &java_root(), Path::new("wx/csba"), Path::new("wx/csba/app")).unwrap();

        let java = root.join("src/main/java");
        assert!(java.join("wx/csba/app/App.java").exists());
        assert!(java.join("wx/csba/app/app/Inner.java").exists());
    }

    #[test]
    fn test_absent_optional_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");

        let roots = vec![
            SourceRoot::required("src/main/java"),
            SourceRoot::optional("module/api/src/main/java"),
        ];
        let report = remap(root, &roots, Path::new("wx/csba"), Path::new("com/acme")).unwrap();

        assert_eq!(report.remapped, vec![PathBuf::from("src/main/java")]);
        assert_eq!(report.skipped, vec![PathBuf::from("module/api/src/main/java")]);
        assert!(!root.join("module").exists());
    }

    #[test]
    fn test_missing_required_root_fails_before_any_move() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/resources/wx/csba/app.yml", "x");

        let roots = vec![
            SourceRoot::optional("src/main/resources"),
            SourceRoot::required("src/main/java"),
        ];
        let err = remap(root, &roots, Path::new("wx/csba"), Path::new("com/acme")).unwrap_err();

        assert!(matches!(err, ScaffoldError::MissingSourceRoot { .. }));
        assert!(root.join("src/main/resources/wx/csba/app.yml").exists());
    }

    #[test]
    fn test_non_empty_target_is_a_collision() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        write(root, "src/main/java/com/acme/Existing.java", "mine");

        let err = remap(root, &java_root(), Path::new("wx/csba"), Path::new("com/acme")).unwrap_err();

        assert!(matches!(err, ScaffoldError::PathCollision { .. }));
        assert!(root.join("src/main/java/wx/csba/App.java").exists());
        assert!(root.join("src/main/java/com/acme/Existing.java").exists());
    }

    #[test]
    fn test_empty_target_directory_is_reused() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        fs::create_dir_all(root.join("src/main/java/com/acme")).unwrap();

        remap(root, &java_root(), Path::new("wx/csba"), Path::new("com/acme")).unwrap();

        assert!(root.join("src/main/java/com/acme/App.java").exists());
    }

    #[test]
    fn test_default_source_roots_cover_modules() {
        let roots = default_source_roots();
        assert_eq!(roots.len(), 10);
        assert!(roots[0].required);
        assert!(roots
            .iter()
            .any(|r| r.path == Path::new("module/shared/src/main/resources")));
    }

    #[test]
    fn test_ancestor_target_with_other_files_is_a_collision() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        write(root, "src/main/java/wx/Other.java", "other");

        let err = remap(root, &java_root(), Path::new("wx/csba"), Path::new("wx")).unwrap_err();

        let java = root.join("src/main/java");
        assert!(matches!(err, ScaffoldError::PathCollision { .. }));
        assert_eq!(fs::read_to_string(java.join("wx/csba/App.java")).unwrap(), "app");
        assert!(java.join("wx/Other.java").exists());
        assert!(!java.join(".package-remap").exists());
    }

    #[test]
    fn test_moves_to_ancestor_package() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/core/App.java", "app");
        write(root, "src/main/java/wx/csba/core/web/Controller.java", "ctl");

        let report =
            remap(root, &java_root(), Path::new("wx/csba/core"), Path::new("wx")).unwrap();

        let java = root.join("src/main/java");
        assert_eq!(fs::read_to_string(java.join("wx/App.java")).unwrap(), "app");
        assert!(java.join("wx/web/Controller.java").exists());
        assert!(!java.join("wx/csba").exists());
        assert!(!java.join(".package-remap").exists());
        assert!(report.retained.is_empty());
    }

    #[test]
    fn test_failed_placement_restores_sources() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/main/java/wx/csba/App.java", "app");
        // a plain file where the target's parent directory must go
        write(root, "src/main/java/com", "not a directory");

        let err = remap(root, &java_root(), Path::new("wx/csba"), Path::new("com/acme")).unwrap_err();

        let java = root.join("src/main/java");
        assert!(matches!(err, ScaffoldError::Io { .. }));
        assert_eq!(fs::read_to_string(java.join("wx/csba/App.java")).unwrap(), "app");
        assert!(!java.join(".package-remap").exists());
    }
}
