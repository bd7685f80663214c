//! Literal placeholder replacement across every file of a materialized tree.
//!
//! Runs in two passes: the file list is collected first, then each file is
//! rewritten. Only file contents are touched; directory names are left to the
//! path remapper so the two substitutions never interfere.

use crate::domain::model::RewriteStats;
use crate::utils::error::{Result, ScaffoldError};
use crate::utils::fs::{walk_error, VCS_DIRS};
use aho_corasick::{AhoCorasick, MatchKind};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bytes inspected when sniffing for binary content.
const BINARY_SNIFF_LEN: usize = 8000;

/// Replaces every literal, non-overlapping occurrence of `from` with `to`, left
/// to right, in every text file under `root`.
///
/// Version-control internals are not visited. Files that look binary are left
/// untouched and counted in `binary_files_skipped`.
pub fn rewrite_contents(root: &Path, from: &str, to: &str) -> Result<RewriteStats> {
    if from.is_empty() {
        return Err(ScaffoldError::InvalidPackageId {
            value: from.to_string(),
            reason: "replacement token cannot be empty".to_string(),
        });
    }

    let matcher = AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostFirst)
        .build([from])
        .map_err(|e| ScaffoldError::Config {
            message: format!("cannot build matcher for '{}': {}", from, e),
        })?;

    let files = collect_files(root)?;
    let mut stats = RewriteStats {
        files_scanned: files.len(),
        ..RewriteStats::default()
    };

    for path in files {
        let contents = fs::read(&path).map_err(ScaffoldError::io_at(&path))?;

        if looks_binary(&contents) {
            tracing::debug!("Skipping binary file {}", path.display());
            stats.binary_files_skipped += 1;
            continue;
        }

        let occurrences = matcher.find_iter(&contents).count();
        if occurrences == 0 {
            continue;
        }

        let rewritten = matcher.replace_all_bytes(&contents, &[to]);
        if rewritten != contents {
            fs::write(&path, &rewritten).map_err(ScaffoldError::io_at(&path))?;
            stats.files_modified += 1;
        }
        stats.replacements += occurrences;
        tracing::debug!("Rewrote {} occurrence(s) in {}", occurrences, path.display());
    }

    Ok(stats)
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && e.file_name().to_str().is_some_and(|n| VCS_DIRS.contains(&n)))
        });

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn looks_binary(contents: &[u8]) -> bool {
    let end = contents.len().min(BINARY_SNIFF_LEN);
    contents[..end].contains(&0)
}
