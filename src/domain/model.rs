use crate::utils::error::{Result, ScaffoldError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Package identifier baked into the upstream boilerplates.
pub const DEFAULT_PLACEHOLDER: &str = "wx.csba";

/// Boilerplate flavour inside the template repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Gradle,
    Maven,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gradle => "gradle",
            Self::Maven => "maven",
        }
    }

    /// Directory of this boilerplate relative to the repository root.
    pub fn boilerplate_dir(&self) -> String {
        format!("{}-boilerplate", self.as_str())
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dot-separated package identifier such as `com.acme.widget`.
///
/// The content form is the identifier verbatim, as it appears in source text.
/// The path form joins every segment with the platform separator, as it
/// appears on disk under a source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageId(String);

impl PackageId {
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = |reason: String| ScaffoldError::InvalidPackageId {
            value: value.to_string(),
            reason,
        };

        if value.is_empty() {
            return Err(invalid("package identifier cannot be empty".to_string()));
        }

        for segment in value.split('.') {
            if segment.is_empty() {
                return Err(invalid("segments between dots cannot be empty".to_string()));
            }
            if segment.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid(format!("segment '{}' starts with a digit", segment)));
            }
            if let Some(bad) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
            {
                return Err(invalid(format!(
                    "segment '{}' contains invalid character '{}'",
                    segment, bad
                )));
            }
        }

        Ok(Self(value.to_string()))
    }

    /// Built-in identifiers that are known to be well formed.
    pub(crate) fn from_static(value: &'static str) -> Self {
        Self(value.to_string())
    }

    pub fn content_form(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn path_form(&self) -> PathBuf {
        self.segments().collect()
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the user asked for. Built once from caller input and never mutated.
#[derive(Debug, Clone)]
pub struct ProjectRequest {
    pub name: String,
    pub package: PackageId,
    pub kind: TemplateKind,
}

impl ProjectRequest {
    pub fn new(name: &str, package: &str, kind: TemplateKind) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ScaffoldError::Usage {
                message: "project name cannot be empty".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            package: PackageId::parse(package)?,
            kind,
        })
    }
}

/// A template-relative directory holding package-structured sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRoot {
    pub path: PathBuf,
    #[serde(default)]
    pub required: bool,
}

impl SourceRoot {
    pub fn required(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            required: true,
        }
    }

    pub fn optional(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
            required: false,
        }
    }
}

/// Everything the engine needs to know about a template besides its contents.
#[derive(Debug, Clone)]
pub struct TemplateLayout {
    pub placeholder: PackageId,
    pub source_roots: Vec<SourceRoot>,
    pub reserved_names: Vec<String>,
    pub allowed_files: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub files_scanned: usize,
    pub files_modified: usize,
    pub binary_files_skipped: usize,
    pub replacements: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    pub remapped: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    /// Placeholder directories kept because something else still lives in them.
    pub retained: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaffoldState {
    Validating,
    Fetching,
    Staging,
    Rewriting,
    Remapping,
    Done,
    Failed(String),
}

impl std::fmt::Display for ScaffoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validating => f.write_str("validating"),
            Self::Fetching => f.write_str("fetching"),
            Self::Staging => f.write_str("staging"),
            Self::Rewriting => f.write_str("rewriting"),
            Self::Remapping => f.write_str("remapping"),
            Self::Done => f.write_str("done"),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScaffoldReport {
    pub root: PathBuf,
    pub rewrite: RewriteStats,
    pub remap: RemapReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_package_id_forms() {
        let package = PackageId::parse("com.acme.widget").unwrap();
        assert_eq!(package.content_form(), "com.acme.widget");
        assert_eq!(package.path_form(), Path::new("com").join("acme").join("widget"));
        assert_eq!(package.segments().count(), 3);
    }

    #[test]
    fn test_package_id_rejects_malformed_identifiers() {
        for bad in ["", ".com", "com.", "com..acme", "com.1acme", "com/acme", "com.ac-me", "a.b c"] {
            assert!(PackageId::parse(bad).is_err(), "{bad} should be rejected");
        }
        assert!(PackageId::parse("wx.csba").is_ok());
        assert!(PackageId::parse("single").is_ok());
        assert!(PackageId::parse("com.acme_inc.v2").is_ok());
    }

    #[test]
    fn test_template_kind_boilerplate_dir() {
        assert_eq!(TemplateKind::Gradle.boilerplate_dir(), "gradle-boilerplate");
        assert_eq!(TemplateKind::Maven.boilerplate_dir(), "maven-boilerplate");
        assert_eq!(TemplateKind::default(), TemplateKind::Gradle);
    }

    #[test]
    fn test_project_request_requires_name() {
        assert!(ProjectRequest::new("", "wx.csba", TemplateKind::Gradle).is_err());
        assert!(ProjectRequest::new("demo", "bad..id", TemplateKind::Gradle).is_err());
        let request = ProjectRequest::new("demo", "com.acme", TemplateKind::Maven).unwrap();
        assert_eq!(request.package.content_form(), "com.acme");
    }
}
