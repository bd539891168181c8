pub mod http;
pub mod locator;
pub mod registry;
pub mod static_repo;
pub mod traits;

pub use http::{HttpFetcher, JsonFetcher};
pub use locator::{fetch_package_json, RepoLocator};
pub use registry::{extract_dependencies, name_and_version, select_version, RegistrySource};
pub use static_repo::StaticRepo;
pub use traits::{ManifestSource, SourceError};
