pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::{LocalDirFetcher, RemoteArchiveFetcher};
pub use crate::config::ScaffoldConfig;
pub use crate::core::scaffold::ScaffoldEngine;
pub use crate::domain::model::{PackageId, ProjectRequest, ScaffoldReport, TemplateKind, TemplateLayout};
pub use crate::domain::ports::TemplateFetcher;
pub use crate::utils::cancel::CancellationToken;
pub use crate::utils::error::{Result, ScaffoldError};
