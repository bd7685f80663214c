use crate::utils::error::{Result, ScaffoldError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ScaffoldError::ConfigValidation {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ScaffoldError::ConfigValidation {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ScaffoldError::ConfigValidation {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// Checks that a configured path is relative and stays inside the project.
pub fn validate_relative_path(field_name: &str, path: &str) -> Result<()> {
    let invalid = |reason: &str| ScaffoldError::ConfigValidation {
        field: field_name.to_string(),
        value: path.to_string(),
        reason: reason.to_string(),
    };

    if path.trim().is_empty() {
        return Err(invalid("Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid("Path contains null bytes"));
    }

    let as_path = std::path::Path::new(path);
    if as_path.is_absolute() {
        return Err(invalid("Path must be relative to the project root"));
    }
    if as_path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(invalid("Path must not contain '..'"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(ScaffoldError::ConfigValidation {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ScaffoldError::ConfigValidation {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("template.repository", "https://github.com/a/b").is_ok());
        assert!(validate_url("template.repository", "http://localhost:8080/a").is_ok());
        assert!(validate_url("template.repository", "").is_err());
        assert!(validate_url("template.repository", "invalid-url").is_err());
        assert!(validate_url("template.repository", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("source_roots", "src/main/java").is_ok());
        assert!(validate_relative_path("source_roots", "").is_err());
        assert!(validate_relative_path("source_roots", "/etc").is_err());
        assert!(validate_relative_path("source_roots", "../outside").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("fetch.timeout_seconds", 30, 1).is_ok());
        assert!(validate_positive_number("fetch.timeout_seconds", 0, 1).is_err());
    }
}
