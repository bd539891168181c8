pub mod resolve;
pub mod settings;

pub use settings::{RegistryConfig, Settings};

use std::path::PathBuf;

use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "depgraph.toml";
pub const CONFIG_ENV: &str = "DEPGRAPH_CONFIG";
pub const REGISTRY_ENV: &str = "DEPGRAPH_REGISTRY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config at {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
