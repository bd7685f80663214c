use crate::adapters::RemoteArchiveFetcher;
use crate::core::{destination_guard, name_validator, path_remapper};
use crate::domain::model::{PackageId, SourceRoot, TemplateLayout, DEFAULT_PLACEHOLDER};
use crate::utils::error::{Result, ScaffoldError};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_relative_path, validate_url,
    Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REPOSITORY: &str = "https://github.com/wxyyxc1992/create-spring-boot-app";
pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Optional configuration file. Every section and key may be omitted.
///
/// ```toml
/// [template]
/// repository = "https://github.com/acme/boot-templates"
/// branch = "main"
/// placeholder = "org.example"
/// source_roots = [{ path = "src/main/java", required = true }]
///
/// [fetch]
/// token = "${GITHUB_TOKEN}"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaffoldConfig {
    pub template: TemplateSection,
    pub safety: SafetySection,
    pub fetch: FetchSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSection {
    pub repository: String,
    pub branch: String,
    /// Direct archive URL; takes precedence over repository + branch.
    pub archive_url: Option<String>,
    pub placeholder: String,
    pub source_roots: Vec<SourceRoot>,
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            archive_url: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            source_roots: path_remapper::default_source_roots(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetySection {
    pub reserved_names: Vec<String>,
    pub allowed_files: Vec<String>,
}

impl Default for SafetySection {
    fn default() -> Self {
        Self {
            reserved_names: name_validator::default_reserved_names(),
            allowed_files: destination_guard::default_allowed_files(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_seconds: u64,
    pub token: Option<String>,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            token: None,
        }
    }
}

impl ScaffoldConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ScaffoldError::io_at(path))?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScaffoldError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GITHUB_TOKEN})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScaffoldError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        match &self.template.archive_url {
            Some(url) => validate_url("template.archive_url", url)?,
            None => {
                validate_url("template.repository", &self.template.repository)?;
                validate_non_empty_string("template.branch", &self.template.branch)?;
            }
        }

        PackageId::parse(&self.template.placeholder)?;

        if self.template.source_roots.is_empty() {
            return Err(ScaffoldError::ConfigValidation {
                field: "template.source_roots".to_string(),
                value: "[]".to_string(),
                reason: "At least one source root is required".to_string(),
            });
        }
        for root in &self.template.source_roots {
            validate_relative_path("template.source_roots", &root.path.to_string_lossy())?;
        }

        validate_positive_number("fetch.timeout_seconds", self.fetch.timeout_seconds, 1)?;

        Ok(())
    }

    pub fn layout(&self) -> Result<TemplateLayout> {
        Ok(TemplateLayout {
            placeholder: PackageId::parse(&self.template.placeholder)?,
            source_roots: self.template.source_roots.clone(),
            reserved_names: self.safety.reserved_names.clone(),
            allowed_files: self.safety.allowed_files.clone(),
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_seconds)
    }

    /// Access token, unless it is empty or still an unresolved `${VAR}`.
    pub fn token(&self) -> Option<String> {
        let token = self.fetch.token.as_ref()?;
        if token.contains("${") {
            tracing::warn!("⚠️  fetch.token references an unset environment variable, ignoring it");
            return None;
        }
        Some(token.clone())
    }

    pub fn remote_fetcher(&self) -> Result<RemoteArchiveFetcher> {
        let fetcher = match &self.template.archive_url {
            Some(url) => {
                let url = Url::parse(url).map_err(|e| ScaffoldError::ConfigValidation {
                    field: "template.archive_url".to_string(),
                    value: url.clone(),
                    reason: format!("Invalid URL format: {}", e),
                })?;
                RemoteArchiveFetcher::new(url)?
            }
            None => RemoteArchiveFetcher::for_github(&self.template.repository, &self.template.branch)?,
        };
        Ok(fetcher.with_token(self.token()))
    }
}

impl Validate for ScaffoldConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
