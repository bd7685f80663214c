use crate::domain::model::{PackageId, TemplateKind, DEFAULT_PLACEHOLDER};
use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "create-boot-app", version)]
#[command(about = "Create a Spring Boot project from a remote boilerplate")]
#[command(after_help = "Only <PROJECT_NAME> is required, e.g.\n  create-boot-app my-spring-boot-app")]
pub struct CliConfig {
    /// Directory of the new project, relative to the current directory
    pub project_name: String,

    /// Package name of the generated sources
    #[arg(short, long, default_value = DEFAULT_PLACEHOLDER)]
    pub package: String,

    /// Boilerplate to start from
    #[arg(short = 't', long = "type", value_enum, default_value_t = TemplateKind::Gradle)]
    pub template_type: TemplateKind,

    /// TOML file overriding the template repository and layout
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use a local checkout of the template repository instead of downloading it
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Seconds to wait for the template download (overrides the config file)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("project_name", &self.project_name)?;
        PackageId::parse(&self.package)?;
        if let Some(timeout) = self.timeout {
            validate_positive_number("timeout", timeout, 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::try_parse_from(["create-boot-app", "demo"]).unwrap();
        assert_eq!(config.project_name, "demo");
        assert_eq!(config.package, "wx.csba");
        assert_eq!(config.template_type, TemplateKind::Gradle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_options() {
        let config = CliConfig::try_parse_from([
            "create-boot-app",
            "demo",
            "-p",
            "com.acme.widget",
            "-t",
            "maven",
            "--timeout",
            "30",
        ])
        .unwrap();
        assert_eq!(config.package, "com.acme.widget");
        assert_eq!(config.template_type, TemplateKind::Maven);
        assert_eq!(config.timeout, Some(30));
    }

    #[test]
    fn test_missing_project_name_is_usage_error() {
        assert!(CliConfig::try_parse_from(["create-boot-app"]).is_err());
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(CliConfig::try_parse_from(["create-boot-app", "demo", "-t", "ant"]).is_err());
    }

    #[test]
    fn test_validation() {
        let config =
            CliConfig::try_parse_from(["create-boot-app", "demo", "-p", "com..acme"]).unwrap();
        assert!(config.validate().is_err());

        let config =
            CliConfig::try_parse_from(["create-boot-app", "demo", "--timeout", "0"]).unwrap();
        assert!(config.validate().is_err());
    }
}
