use crate::utils::error::{Result, ScaffoldError};

/// Names that would shadow a dependency of the generated project's tooling.
pub const RESERVED_NAMES: &[&str] = &["chalk", "react", "react-dom"];

pub fn default_reserved_names() -> Vec<String> {
    RESERVED_NAMES.iter().map(|n| n.to_string()).collect()
}

/// Checks the basename of the target directory. Pure, no side effects.
pub fn validate(app_name: &str, reserved: &[String]) -> Result<()> {
    if app_name.is_empty() || app_name == "." || app_name == ".." {
        return Err(ScaffoldError::InvalidProjectName {
            name: app_name.to_string(),
            reason: "name must refer to a directory".to_string(),
        });
    }
    if app_name.contains('\0') {
        return Err(ScaffoldError::InvalidProjectName {
            name: app_name.to_string(),
            reason: "name contains null bytes".to_string(),
        });
    }

    if reserved.iter().any(|r| r == app_name) {
        let mut reserved = reserved.to_vec();
        reserved.sort();
        return Err(ScaffoldError::ReservedName {
            name: app_name.to_string(),
            reserved,
        });
    }

    Ok(())
}
