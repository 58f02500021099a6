use std::path::PathBuf;

use reserveit_config::LoadError;
use reserveit_core::page::RenderError;
use thiserror::Error;

/// Errors surfaced to the site host.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The host should report this as a configuration error and stop.
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("reserve-it asset missing from package: {}", .0.display())]
    AssetMissing(PathBuf),
    #[error("Virtual page '{path}' refers to unknown resource '{resource}'")]
    UnknownResource { path: String, resource: String },
    #[error("Failed to render '{path}': {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },
    #[error("Invalid front matter in '{path}': {source}")]
    FrontMatter {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<LoadError> for PluginError {
    fn from(error: LoadError) -> Self {
        PluginError::Configuration(error.to_string())
    }
}

impl PluginError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PluginError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PluginError::Configuration(_))
    }
}

/// Result type for plugin hooks.
pub type Result<T> = std::result::Result<T, PluginError>;
