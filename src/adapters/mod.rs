// Adapters layer: concrete template fetchers behind the `TemplateFetcher` port.

pub mod local_dir;
pub mod remote_archive;

pub use local_dir::LocalDirFetcher;
pub use remote_archive::RemoteArchiveFetcher;
