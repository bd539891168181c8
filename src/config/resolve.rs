use std::env;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Settings, CONFIG_ENV, CONFIG_FILE_NAME, REGISTRY_ENV};

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub registry: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Loads settings with precedence: command line > `DEPGRAPH_REGISTRY` >
/// config file > defaults. The config file is `config_path`, else
/// `DEPGRAPH_CONFIG`, else the nearest `depgraph.toml` above `start`.
pub fn load_settings(
    start: impl AsRef<Path>,
    config_path: Option<PathBuf>,
    overrides: &Overrides,
) -> Result<Settings, ConfigError> {
    load_settings_with_env(start.as_ref(), config_path, overrides, |key| {
        env::var(key).ok()
    })
}

pub fn load_settings_with_env<E>(
    start: &Path,
    config_path: Option<PathBuf>,
    overrides: &Overrides,
    env: E,
) -> Result<Settings, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let explicit = config_path.or_else(|| env(CONFIG_ENV).map(PathBuf::from));
    let mut settings = match explicit {
        Some(path) => load_settings_file(&path)?,
        None => match find_config_from(start) {
            Some(path) => load_settings_file(&path)?,
            None => Settings::default(),
        },
    };

    if let Some(url) = env(REGISTRY_ENV).filter(|url| !url.trim().is_empty()) {
        settings.registry.url = url;
    }
    if let Some(url) = overrides.registry.clone() {
        settings.registry.url = url;
    }
    if let Some(timeout) = overrides.timeout_secs {
        settings.registry.timeout_secs = timeout;
    }

    validate(&mut settings)?;
    Ok(settings)
}

pub fn load_settings_file(path: &Path) -> Result<Settings, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn find_config_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn validate(settings: &mut Settings) -> Result<(), ConfigError> {
    let url = settings.registry.url.trim().trim_end_matches('/').to_string();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            key: "registry.url",
            reason: format!("expected an http(s) URL, got {url:?}"),
        });
    }
    if settings.registry.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            key: "registry.timeout_secs",
            reason: "must be greater than zero".to_string(),
        });
    }
    settings.registry.url = url;
    Ok(())
}
