//! Configuration loading for reserveit.
//!
//! Reads the global app config and the directory of per-resource YAML
//! documents, turning them into validated core types.

mod app;
mod error;
mod files;
mod loader;

pub use app::{app_config_from_env, load_app_config, load_app_config_with};
pub use error::{LoadError, Result};
pub use files::{ensure_yaml, is_yaml};
pub use loader::{load_resource_file, load_resources};
