use std::fs;
use std::path::Path;

use reserveit_core::app_config::AppConfig;

use crate::error::{LoadError, Result};
use crate::files::ensure_yaml;

/// Loads the app config document, applying environment overrides.
pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    load_app_config_with(path, |key| std::env::var(key).ok())
}

/// Loads the app config document, resolving overrides through `lookup`.
pub fn load_app_config_with<F>(path: &Path, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    ensure_yaml(path)?;
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config: AppConfig = if text.trim().is_empty() {
        AppConfig::new("", "")
    } else {
        serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    let invalid = |source| LoadError::InvalidApp {
        path: path.to_path_buf(),
        source,
    };
    config.apply_overrides(lookup).map_err(invalid)?;
    config.validate().map_err(invalid)?;

    tracing::debug!(
        path = %path.display(),
        title = %config.title,
        timezone = %config.timezone,
        "Loaded app config"
    );
    Ok(config)
}

/// Builds the app config from environment variables alone.
pub fn app_config_from_env() -> Result<AppConfig> {
    AppConfig::from_lookup(|key| std::env::var(key).ok()).map_err(LoadError::InvalidEnvironment)
}
