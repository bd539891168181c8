use thiserror::Error;

use crate::config::ConfigError;
use crate::source::traits::SourceError;

#[derive(Debug, Error)]
pub enum DepgraphError {
    #[error("package not found: {name} ({source})")]
    RootNotFound {
        name: String,
        #[source]
        source: SourceError,
    },
    #[error("failed to load manifest for {name}: {source}")]
    ManifestFetch {
        name: String,
        #[source]
        source: SourceError,
    },
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, DepgraphError>;
