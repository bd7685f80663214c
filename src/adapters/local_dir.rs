use crate::domain::ports::TemplateFetcher;
use crate::utils::cancel::StopOnDrop;
use crate::utils::error::{FetchErrorKind, Result, ScaffoldError};
use crate::utils::fs::{copy_tree_until, VCS_DIRS};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Uses a template repository already checked out on disk.
#[derive(Debug, Clone)]
pub struct LocalDirFetcher {
    template_dir: PathBuf,
}

impl LocalDirFetcher {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }
}

#[async_trait]
impl TemplateFetcher for LocalDirFetcher {
    async fn fetch(&self, into: &Path) -> Result<()> {
        if !self.template_dir.is_dir() {
            return Err(ScaffoldError::fetch(
                FetchErrorKind::NotFound,
                format!("template directory {} does not exist", self.template_dir.display()),
            ));
        }

        let guard = StopOnDrop::new();
        let stop = guard.flag();
        let (from, target) = (self.template_dir.clone(), into.to_path_buf());
        let summary =
            tokio::task::spawn_blocking(move || copy_tree_until(&from, &target, VCS_DIRS, &stop))
                .await
                .map_err(|e| ScaffoldError::io_at(&self.template_dir)(std::io::Error::other(e)))??;
        drop(guard);
        tracing::debug!(
            "Copied {} files ({} bytes) from {}",
            summary.files,
            summary.bytes,
            self.template_dir.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.template_dir.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_template_without_vcs_metadata() {
        let template = TempDir::new().unwrap();
        fs::create_dir_all(template.path().join("gradle-boilerplate/src")).unwrap();
        fs::write(template.path().join("gradle-boilerplate/src/a.txt"), "a").unwrap();
        fs::create_dir_all(template.path().join(".git")).unwrap();
        fs::write(template.path().join(".git/HEAD"), "ref").unwrap();

        let staging = TempDir::new().unwrap();
        LocalDirFetcher::new(template.path())
            .fetch(staging.path())
            .await
            .unwrap();

        assert!(staging.path().join("gradle-boilerplate/src/a.txt").exists());
        assert!(!staging.path().join(".git").exists());
    }

    #[tokio::test]
    async fn test_missing_template_dir_is_not_found() {
        let staging = TempDir::new().unwrap();
        let err = LocalDirFetcher::new("/definitely/not/here")
            .fetch(staging.path())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScaffoldError::Fetch {
                kind: FetchErrorKind::NotFound,
                ..
            }
        ));
    }
}
