//! Downloads a repository snapshot as a zip archive and unpacks it.

use crate::domain::ports::TemplateFetcher;
use crate::utils::cancel::StopOnDrop;
use crate::utils::error::{FetchErrorKind, Result, ScaffoldError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

pub struct RemoteArchiveFetcher {
    client: Client,
    archive_url: Url,
    token: Option<String>,
}

impl RemoteArchiveFetcher {
    pub fn new(archive_url: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ScaffoldError::fetch(FetchErrorKind::Network, e.to_string()))?;

        Ok(Self {
            client,
            archive_url,
            token: None,
        })
    }

    /// Fetcher for a GitHub repository branch, e.g.
    /// `https://github.com/owner/repo` + `master`.
    pub fn for_github(repository: &str, branch: &str) -> Result<Self> {
        Self::new(github_archive_url(repository, branch)?)
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn archive_url(&self) -> &Url {
        &self.archive_url
    }

    async fn download(&self) -> Result<Vec<u8>> {
        tracing::debug!("Downloading template archive from {}", self.archive_url);

        let mut request = self.client.get(self.archive_url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_transport_error)?;
        let status = response.status();
        tracing::debug!("Archive response status: {}", status);

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ScaffoldError::fetch(
                    FetchErrorKind::NotFound,
                    format!("{} returned 404", self.archive_url),
                ))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ScaffoldError::fetch(
                    FetchErrorKind::Unauthorized,
                    format!("{} returned {}", self.archive_url, status),
                ))
            }
            s => {
                return Err(ScaffoldError::fetch(
                    FetchErrorKind::Network,
                    format!("{} returned {}", self.archive_url, s),
                ))
            }
        }

        let bytes = response.bytes().await.map_err(classify_transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl TemplateFetcher for RemoteArchiveFetcher {
    async fn fetch(&self, into: &Path) -> Result<()> {
        let data = self.download().await?;
        tracing::debug!("Downloaded {} bytes, extracting", data.len());

        // 解壓縮在 blocking 執行緒上跑，逾時或取消時透過 guard 通知停止
        let guard = StopOnDrop::new();
        let stop = guard.flag();
        let target = into.to_path_buf();
        let extracted =
            tokio::task::spawn_blocking(move || extract_archive_until(&data, &target, &stop))
                .await
                .map_err(|e| archive_error(format!("extraction task failed: {}", e)))??;
        drop(guard);
        tracing::debug!("Extracted {} files into {}", extracted, into.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.archive_url.to_string()
    }
}

pub fn github_archive_url(repository: &str, branch: &str) -> Result<Url> {
    let trimmed = repository.trim_end_matches('/').trim_end_matches(".git");
    let url = format!("{}/archive/refs/heads/{}.zip", trimmed, branch);
    Url::parse(&url).map_err(|e| ScaffoldError::ConfigValidation {
        field: "template.repository".to_string(),
        value: repository.to_string(),
        reason: format!("Invalid URL format: {}", e),
    })
}

fn classify_transport_error(err: reqwest::Error) -> ScaffoldError {
    let kind = if err.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Network
    };
    ScaffoldError::fetch(kind, err.to_string())
}

fn archive_error(message: impl Into<String>) -> ScaffoldError {
    ScaffoldError::fetch(FetchErrorKind::Archive, message)
}

/// Unpacks `data` into `into` and returns the number of files written.
///
/// A single directory wrapping every entry (as in GitHub snapshots) is
/// stripped. Entries whose names would escape `into` are rejected.
pub fn extract_archive(data: &[u8], into: &Path) -> Result<usize> {
    extract_archive_until(data, into, &AtomicBool::new(false))
}

/// Like [`extract_archive`], but gives up with `Cancelled` once `stop` is raised.
pub fn extract_archive_until(data: &[u8], into: &Path, stop: &AtomicBool) -> Result<usize> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| archive_error(format!("cannot open archive: {}", e)))?;

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| archive_error(format!("cannot read entry {}: {}", i, e)))?;
        let name = file
            .enclosed_name()
            .ok_or_else(|| archive_error(format!("unsafe entry path '{}'", file.name())))?;
        names.push(name);
    }

    if names.is_empty() {
        return Err(archive_error("archive is empty"));
    }

    let wrapper = common_wrapper(&names);
    let mut written = 0;

    for (i, name) in names.iter().enumerate() {
        if stop.load(Ordering::SeqCst) {
            return Err(ScaffoldError::fetch(
                FetchErrorKind::Cancelled,
                format!("extraction stopped after {} files", written),
            ));
        }
        let relative = match &wrapper {
            Some(prefix) => name.strip_prefix(prefix).unwrap_or(name),
            None => name.as_path(),
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let dest = into.join(relative);

        let mut file = archive
            .by_index(i)
            .map_err(|e| archive_error(format!("cannot read entry {}: {}", i, e)))?;

        if file.is_dir() {
            fs::create_dir_all(&dest).map_err(ScaffoldError::io_at(&dest))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(ScaffoldError::io_at(parent))?;
        }
        let mut out = fs::File::create(&dest).map_err(ScaffoldError::io_at(&dest))?;
        std::io::copy(&mut file, &mut out)
            .map_err(|e| archive_error(format!("cannot extract {}: {}", name.display(), e)))?;

        // 保留可執行權限（例如 gradlew）
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&dest, fs::Permissions::from_mode(mode & 0o777))
                    .map_err(ScaffoldError::io_at(&dest))?;
            }
        }

        written += 1;
    }

    Ok(written)
}

fn common_wrapper(names: &[PathBuf]) -> Option<PathBuf> {
    let first = match names[0].components().next()? {
        Component::Normal(part) => PathBuf::from(part),
        _ => return None,
    };

    let all_wrapped = names.iter().all(|name| name.starts_with(&first));
    let has_nested = names.iter().any(|name| name.components().count() > 1);
    (all_wrapped && has_nested).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default().unix_permissions(0o755))
                    .unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_github_archive_url() {
        let url = github_archive_url("https://github.com/owner/repo.git", "master").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/owner/repo/archive/refs/heads/master.zip"
        );
        assert!(github_archive_url("not a url", "master").is_err());
    }

    #[test]
    fn test_extract_stops_once_flag_raised() {
        let data = build_zip(&[
            ("repo-master/gradle-boilerplate/build.gradle", "group 'wx.csba'"),
            ("repo-master/gradle-boilerplate/gradlew", "#!/bin/sh"),
        ]);
        let temp = TempDir::new().unwrap();

        let err = extract_archive_until(&data, temp.path(), &AtomicBool::new(true)).unwrap_err();

        assert!(matches!(
            err,
            ScaffoldError::Fetch {
                kind: FetchErrorKind::Cancelled,
                ..
            }
        ));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_extract_strips_single_wrapper_directory() {
        let data = build_zip(&[
            ("repo-master/", ""),
            ("repo-master/gradle-boilerplate/", ""),
            ("repo-master/gradle-boilerplate/gradlew", "#!/bin/sh"),
            ("repo-master/README.md", "readme"),
        ]);
        let temp = TempDir::new().unwrap();

        let written = extract_archive(&data, temp.path()).unwrap();

        assert_eq!(written, 2);
        assert!(temp.path().join("gradle-boilerplate/gradlew").exists());
        assert!(temp.path().join("README.md").exists());
        assert!(!temp.path().join("repo-master").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(temp.path().join("gradle-boilerplate/gradlew"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn test_extract_keeps_layout_without_wrapper() {
        let data = build_zip(&[("a.txt", "a"), ("dir/b.txt", "b")]);
        let temp = TempDir::new().unwrap();

        extract_archive(&data, temp.path()).unwrap();

        assert!(temp.path().join("a.txt").exists());
        assert!(temp.path().join("dir/b.txt").exists());
    }

    #[test]
    fn test_garbage_is_an_archive_error() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(b"definitely not a zip", temp.path()).unwrap_err();
        assert!(matches!(
            err,
            ScaffoldError::Fetch {
                kind: FetchErrorKind::Archive,
                ..
            }
        ));
    }
}
