use std::path::{Path, PathBuf};
use thiserror::Error;

/// Finer-grained reason behind a template fetch failure.
///
/// The orchestrator aborts on every kind alike; the distinction only feeds
/// logging and the advice printed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    NotFound,
    Unauthorized,
    Archive,
    Timeout,
    Cancelled,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Network => "network",
            Self::NotFound => "not found",
            Self::Unauthorized => "unauthorized",
            Self::Archive => "archive",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("Usage error: {message}")]
    Usage { message: String },

    #[error("Invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: String },

    #[error("Cannot create a project called '{name}' because a dependency with the same name exists")]
    ReservedName { name: String, reserved: Vec<String> },

    #[error("Invalid package identifier '{value}': {reason}")]
    InvalidPackageId { value: String, reason: String },

    #[error("Directory {} contains files that could conflict: {}", root.display(), conflicts.join(", "))]
    DestinationConflict { root: PathBuf, conflicts: Vec<String> },

    #[error("Template fetch failed ({kind}): {message}")]
    Fetch { kind: FetchErrorKind, message: String },

    #[error("Unexpected template layout: {message}")]
    TemplateLayout { message: String },

    #[error("Placeholder '{token}' not found in template: {message}")]
    PlaceholderMismatch { token: String, message: String },

    #[error("Required source root {} is missing the placeholder package directory", root.display())]
    MissingSourceRoot { root: PathBuf },

    #[error("Target package directory {} already exists and is not empty", path.display())]
    PathCollision { path: PathBuf },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    ConfigValidation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Usage,
    Validation,
    Conflict,
    Network,
    FileSystem,
    Configuration,
}

impl ScaffoldError {
    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            message: message.into(),
        }
    }

    /// Builds a mapper that attaches `path` to an `io::Error`, for use with `map_err`.
    pub fn io_at(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| Self::Io { path, source }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Usage { .. } => ErrorCategory::Usage,
            Self::InvalidProjectName { .. }
            | Self::ReservedName { .. }
            | Self::InvalidPackageId { .. } => ErrorCategory::Validation,
            Self::DestinationConflict { .. } | Self::PathCollision { .. } => {
                ErrorCategory::Conflict
            }
            Self::Fetch { .. } => ErrorCategory::Network,
            Self::TemplateLayout { .. }
            | Self::PlaceholderMismatch { .. }
            | Self::MissingSourceRoot { .. }
            | Self::Io { .. } => ErrorCategory::FileSystem,
            Self::ConfigValidation { .. } | Self::Config { .. } => ErrorCategory::Configuration,
        }
    }

    /// Every failure maps to exit code 1; success is the only zero.
    pub fn exit_code(&self) -> i32 {
        1
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ReservedName { name, reserved } => format!(
                "Cannot create a project called '{}' because a dependency with the same name exists.\nThe following names are not allowed:\n{}",
                name,
                reserved
                    .iter()
                    .map(|n| format!("  {}", n))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            Self::DestinationConflict { root, conflicts } => format!(
                "Directory {} contains files that could conflict:\n{}",
                root.display(),
                conflicts
                    .iter()
                    .map(|n| format!("  {}", n))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            Self::Fetch { kind, message } => match kind {
                FetchErrorKind::Timeout => "Fetching the template timed out".to_string(),
                FetchErrorKind::Cancelled => "Fetching the template was cancelled".to_string(),
                _ => format!("Could not fetch the template: {}", message),
            },
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Usage { .. } => "Run with --help to see all options",
            Self::InvalidProjectName { .. } | Self::ReservedName { .. } => {
                "Please choose a different project name"
            }
            Self::InvalidPackageId { .. } => {
                "Use a dot-separated package name such as com.example.app"
            }
            Self::DestinationConflict { .. } => {
                "Use a new directory name or remove the conflicting files"
            }
            Self::Fetch { kind, .. } => match kind {
                FetchErrorKind::NotFound => "Check the template repository URL and branch",
                FetchErrorKind::Unauthorized => "Check the access token configured for the template repository",
                FetchErrorKind::Timeout => "Check your network connection or raise --timeout",
                FetchErrorKind::Cancelled => "Run the command again to retry",
                FetchErrorKind::Archive => "The downloaded template is corrupt; try again later",
                FetchErrorKind::Network => "Check your network connection",
            },
            Self::TemplateLayout { .. } | Self::PlaceholderMismatch { .. } => {
                "Check that the template repository and --type match, and the configured placeholder"
            }
            Self::MissingSourceRoot { .. } | Self::PathCollision { .. } | Self::Io { .. } => {
                "Check disk permissions, delete the partially generated directory and start over"
            }
            Self::ConfigValidation { .. } | Self::Config { .. } => {
                "Check the configuration file and command line options"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_errors_are_distinguishable_from_io_errors() {
        let fetch = ScaffoldError::fetch(FetchErrorKind::Network, "connection refused");
        let io = ScaffoldError::io_at("/tmp/x")(std::io::Error::other("disk full"));

        assert_eq!(fetch.category(), ErrorCategory::Network);
        assert_eq!(io.category(), ErrorCategory::FileSystem);
        assert_ne!(fetch.recovery_suggestion(), io.recovery_suggestion());
        assert_eq!(fetch.exit_code(), 1);
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn test_reserved_name_message_lists_names() {
        let err = ScaffoldError::ReservedName {
            name: "react".to_string(),
            reserved: vec!["chalk".to_string(), "react".to_string()],
        };
        let message = err.user_friendly_message();
        assert!(message.contains("  chalk"));
        assert!(message.contains("'react'"));
    }
}
