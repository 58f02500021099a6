use std::path::{Path, PathBuf};

use reserveit_core::resource::ConfigError;
use thiserror::Error;

/// Errors raised while loading configuration files.
///
/// Every variant names the offending file, and the resource when one is
/// known, so a bad file in a large directory is easy to find.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a YAML file (expected .yaml or .yml)", .path.display())]
    UnsupportedExtension { path: PathBuf },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{} must contain a mapping at the top level", .path.display())]
    NotAMapping { path: PathBuf },
    #[error("Invalid resource '{resource}' in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        resource: String,
        #[source]
        source: ConfigError,
    },
    #[error("Invalid app config {}: {source}", .path.display())]
    InvalidApp {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
    #[error("Invalid app config from environment: {0}")]
    InvalidEnvironment(#[source] ConfigError),
    #[error("{} yields an empty resource identity", .path.display())]
    EmptyIdentity { path: PathBuf },
    #[error("Resource '{identity}' is defined by both {} and {}", .first.display(), .second.display())]
    DuplicateIdentity {
        identity: String,
        first: PathBuf,
        second: PathBuf,
    },
    #[error("Route prefix '{prefix}' is used by both '{first}' and '{second}' (in {})", .path.display())]
    DuplicateRoutePrefix {
        prefix: String,
        first: String,
        second: String,
        path: PathBuf,
    },
    #[error("No resource files found in {}", .0.display())]
    NoResources(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
}

impl LoadError {
    /// The file or directory the error is about.
    pub fn path(&self) -> &Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::UnsupportedExtension { path }
            | LoadError::Parse { path, .. }
            | LoadError::NotAMapping { path }
            | LoadError::Invalid { path, .. }
            | LoadError::InvalidApp { path, .. }
            | LoadError::EmptyIdentity { path }
            | LoadError::DuplicateRoutePrefix { path, .. } => path.as_path(),
            LoadError::DuplicateIdentity { second, .. } => second.as_path(),
            LoadError::NoResources(path) | LoadError::NotADirectory(path) => path.as_path(),
            LoadError::InvalidEnvironment(_) => Path::new(""),
        }
    }

    /// The resource the error is about, when known.
    pub fn resource(&self) -> Option<&str> {
        match self {
            LoadError::Invalid { resource, .. } => Some(resource),
            LoadError::DuplicateIdentity { identity, .. } => Some(identity),
            LoadError::DuplicateRoutePrefix { second, .. } => Some(second),
            _ => None,
        }
    }
}

/// Result type for loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_file_and_resource() {
        let error = LoadError::Invalid {
            path: PathBuf::from("resources/2-rooms.yaml"),
            resource: "rooms".to_string(),
            source: ConfigError::NoCalendars,
        };

        assert_eq!(
            error.to_string(),
            "Invalid resource 'rooms' in resources/2-rooms.yaml: At least one calendar is required"
        );
        assert_eq!(error.path(), Path::new("resources/2-rooms.yaml"));
        assert_eq!(error.resource(), Some("rooms"));
    }

    #[test]
    fn test_duplicate_identity_display() {
        let error = LoadError::DuplicateIdentity {
            identity: "courts".to_string(),
            first: PathBuf::from("r/1-courts.yaml"),
            second: PathBuf::from("r/courts.yml"),
        };
        assert_eq!(
            error.to_string(),
            "Resource 'courts' is defined by both r/1-courts.yaml and r/courts.yml"
        );
    }
}
