use crate::core::{destination_guard, name_validator, path_remapper, token_rewriter};
use crate::domain::model::{
    PackageId, ProjectRequest, ScaffoldReport, ScaffoldState, TemplateKind, TemplateLayout,
    DEFAULT_PLACEHOLDER,
};
use crate::domain::ports::TemplateFetcher;
use crate::utils::cancel::CancellationToken;
use crate::utils::error::{FetchErrorKind, Result, ScaffoldError};
use crate::utils::fs::move_path;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            placeholder: PackageId::from_static(DEFAULT_PLACEHOLDER),
            source_roots: path_remapper::default_source_roots(),
            reserved_names: name_validator::default_reserved_names(),
            allowed_files: destination_guard::default_allowed_files(),
        }
    }
}

/// Runs one scaffolding pipeline:
/// validate → guard destination → fetch → strip staging → rewrite → remap.
///
/// Stages run strictly in order, each on the filesystem state the previous one
/// left behind. A failure stops the pipeline; the staging directory is always
/// removed but rewrite and remap effects are not rolled back.
pub struct ScaffoldEngine<F: TemplateFetcher> {
    fetcher: F,
    layout: TemplateLayout,
    fetch_timeout: Option<Duration>,
    cancel: CancellationToken,
    state: Mutex<ScaffoldState>,
}

impl<F: TemplateFetcher> ScaffoldEngine<F> {
    pub fn new(fetcher: F, layout: TemplateLayout) -> Self {
        Self {
            fetcher,
            layout,
            fetch_timeout: None,
            cancel: CancellationToken::new(),
            state: Mutex::new(ScaffoldState::Validating),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn layout(&self) -> &TemplateLayout {
        &self.layout
    }

    /// State the last run ended in (or is currently in).
    pub fn state(&self) -> ScaffoldState {
        self.state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn transition(&self, next: ScaffoldState) {
        match &next {
            ScaffoldState::Failed(reason) => tracing::error!("❌ Scaffolding failed: {}", reason),
            other => tracing::info!("▶️  Stage: {}", other),
        }
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Scaffolds `request` into `<cwd>/<request.name>`.
    pub async fn run(&self, request: &ProjectRequest, cwd: &Path) -> Result<ScaffoldReport> {
        self.transition(ScaffoldState::Validating);
        let result = self.execute(request, cwd).await;
        match &result {
            Ok(_) => self.transition(ScaffoldState::Done),
            Err(e) => self.transition(ScaffoldState::Failed(e.to_string())),
        }
        result
    }

    async fn execute(&self, request: &ProjectRequest, cwd: &Path) -> Result<ScaffoldReport> {
        // 驗證
        let root = resolve_root(cwd, &request.name)?;
        let app_name = root
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ScaffoldError::InvalidProjectName {
                name: request.name.clone(),
                reason: "cannot determine directory name".to_string(),
            })?;
        name_validator::validate(app_name, &self.layout.reserved_names)?;

        destination_guard::ensure_exists(&root)?;
        let conflicts = destination_guard::conflicting_entries(&root, &self.layout.allowed_files)?;
        if !conflicts.is_empty() {
            return Err(ScaffoldError::DestinationConflict {
                root: root.clone(),
                conflicts,
            });
        }

        tracing::info!("🚀 Creating a new Spring Boot app in {}", root.display());
        tracing::info!(
            "📦 Initializing {} from {} ({})",
            app_name,
            request.kind.boilerplate_dir(),
            self.fetcher.describe()
        );

        // 抓取遠端模板到暫存目錄，無論成功與否都要移除
        self.transition(ScaffoldState::Fetching);
        let staging = tempfile::Builder::new()
            .prefix(".scaffold-")
            .tempdir_in(&root)
            .map_err(ScaffoldError::io_at(&root))?;
        let staging_path = staging.path().to_path_buf();

        let staged = self
            .fetch_and_strip(&staging_path, request.kind, &root)
            .await;
        let closed = staging.close().map_err(ScaffoldError::io_at(&staging_path));
        staged?;
        closed?;

        // 替換檔案內容中的包名
        self.transition(ScaffoldState::Rewriting);
        let placeholder = &self.layout.placeholder;
        self.ensure_placeholder_present(&root)?;
        tracing::info!("✏️  Changing package name to {}", request.package);
        let rewrite = token_rewriter::rewrite_contents(
            &root,
            placeholder.content_form(),
            request.package.content_form(),
        )?;
        if request.package == *placeholder {
            tracing::info!("Package name unchanged, keeping {}", placeholder);
        } else if rewrite.files_modified == 0 {
            tracing::warn!(
                "⚠️  No file mentioned '{}'; the template may not use this placeholder",
                placeholder
            );
        } else {
            tracing::info!(
                "Rewrote {} of {} files ({} replacements)",
                rewrite.files_modified,
                rewrite.files_scanned,
                rewrite.replacements
            );
        }

        // 重新命名套件目錄
        self.transition(ScaffoldState::Remapping);
        let remap = path_remapper::remap(
            &root,
            &self.layout.source_roots,
            &placeholder.path_form(),
            &request.package.path_form(),
        )?;
        for skipped in &remap.skipped {
            tracing::debug!("Source root {} not present in template", skipped.display());
        }

        Ok(ScaffoldReport {
            root,
            rewrite,
            remap,
        })
    }

    async fn fetch_and_strip(&self, staging: &Path, kind: TemplateKind, root: &Path) -> Result<()> {
        tracing::info!("⬇️  Fetching remote template");
        self.fetch_into(staging).await?;

        self.transition(ScaffoldState::Staging);
        strip_staging_wrapper(&staging.join(kind.boilerplate_dir()), root)
    }

    async fn fetch_into(&self, staging: &Path) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(ScaffoldError::fetch(
                FetchErrorKind::Cancelled,
                "cancelled before fetch started",
            ));
        }

        let fetch = async {
            match self.fetch_timeout {
                Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(staging))
                    .await
                    .map_err(|_| {
                        ScaffoldError::fetch(
                            FetchErrorKind::Timeout,
                            format!("no complete template within {:?}", limit),
                        )
                    })?,
                None => self.fetcher.fetch(staging).await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ScaffoldError::fetch(
                FetchErrorKind::Cancelled,
                "cancelled while fetching",
            )),
            result = fetch => result,
        }
    }

    /// The placeholder's path form must exist under at least one source root,
    /// otherwise the configured token does not match this template.
    fn ensure_placeholder_present(&self, root: &Path) -> Result<()> {
        let path_form = self.layout.placeholder.path_form();
        let found = self
            .layout
            .source_roots
            .iter()
            .any(|r| root.join(&r.path).join(&path_form).is_dir());

        if found {
            Ok(())
        } else {
            Err(ScaffoldError::PlaceholderMismatch {
                token: self.layout.placeholder.to_string(),
                message: format!("no source root contains {}", path_form.display()),
            })
        }
    }
}

fn resolve_root(cwd: &Path, name: &str) -> Result<PathBuf> {
    std::path::absolute(cwd.join(name)).map_err(ScaffoldError::io_at(cwd))
}

/// Moves the children of the fetched boilerplate into the project root.
/// Entries already present in the root (allow-listed files the user had) win.
fn strip_staging_wrapper(boilerplate: &Path, root: &Path) -> Result<()> {
    if !boilerplate.is_dir() {
        let staging = boilerplate.parent().unwrap_or(boilerplate);
        let mut available = Vec::new();
        if let Ok(entries) = fs::read_dir(staging) {
            for entry in entries.flatten() {
                available.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        available.sort();
        return Err(ScaffoldError::TemplateLayout {
            message: format!(
                "template has no '{}' directory (found: {})",
                boilerplate
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                available.join(", ")
            ),
        });
    }

    for entry in fs::read_dir(boilerplate).map_err(ScaffoldError::io_at(boilerplate))? {
        let entry = entry.map_err(ScaffoldError::io_at(boilerplate))?;
        let dest = root.join(entry.file_name());
        if dest.symlink_metadata().is_ok() {
            tracing::warn!(
                "⚠️  Keeping existing {}, template copy skipped",
                dest.display()
            );
            continue;
        }
        move_path(&entry.path(), &dest)?;
    }

    Ok(())
}
