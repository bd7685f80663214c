use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Retrieves a complete template tree into a local staging directory.
///
/// Implementations either leave a usable tree at `into` and return `Ok`, or
/// return a `ScaffoldError::Fetch`. The caller owns `into` and removes it
/// afterwards whatever the outcome.
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self, into: &Path) -> Result<()>;

    /// Short description of the template source, for logs.
    fn describe(&self) -> String;
}
