use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use reserveit_core::app_config::AppConfig;
use reserveit_core::resource::{
    identity_from_stem, resource_from_document, ResourceConfig, ResourceMap,
};
use serde_json::Value;

use crate::error::{LoadError, Result};
use crate::files::{ensure_yaml, is_yaml, sorted_files};

/// Loads every resource file in `dir`.
///
/// Files are read in file-name order and anything that is not YAML is
/// skipped. The first invalid file aborts the load.
pub fn load_resources(dir: &Path, app: &AppConfig) -> Result<ResourceMap> {
    let mut resources = ResourceMap::new();
    let mut sources: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut prefixes: BTreeMap<String, String> = BTreeMap::new();

    for path in sorted_files(dir)? {
        if !is_yaml(&path) {
            tracing::debug!(path = %path.display(), "Skipping non-YAML file");
            continue;
        }

        let identity = identity_of(&path)?;
        if let Some(first) = sources.get(&identity) {
            return Err(LoadError::DuplicateIdentity {
                identity,
                first: first.clone(),
                second: path,
            });
        }

        let resource = load_resource_file(&path, app)?;
        if let Some(first) = prefixes.get(&resource.route_prefix) {
            return Err(LoadError::DuplicateRoutePrefix {
                prefix: resource.route_prefix.clone(),
                first: first.clone(),
                second: identity,
                path,
            });
        }

        tracing::debug!(
            resource = %identity,
            path = %path.display(),
            calendars = resource.calendars.len(),
            "Loaded resource"
        );
        prefixes.insert(resource.route_prefix.clone(), identity.clone());
        if let Err(resource) = resources.insert(resource) {
            return Err(LoadError::DuplicateIdentity {
                first: sources.get(&identity).cloned().unwrap_or_else(|| path.clone()),
                identity: resource.file_prefix.clone(),
                second: path,
            });
        }
        sources.insert(identity, path);
    }

    if resources.is_empty() {
        return Err(LoadError::NoResources(dir.to_path_buf()));
    }

    tracing::info!(
        dir = %dir.display(),
        count = resources.len(),
        "Loaded resource configs"
    );
    Ok(resources)
}

/// Loads and validates a single resource file.
pub fn load_resource_file(path: &Path, app: &AppConfig) -> Result<ResourceConfig> {
    ensure_yaml(path)?;
    let identity = identity_of(path)?;

    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Object(document) = value else {
        return Err(LoadError::NotAMapping {
            path: path.to_path_buf(),
        });
    };

    resource_from_document(
        document,
        &app.resource_defaults,
        &identity,
        &app.global_form_fields,
    )
    .map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        resource: identity,
        source,
    })
}

fn identity_of(path: &Path) -> Result<String> {
    let identity = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(identity_from_stem)
        .unwrap_or_default();
    if identity.is_empty() {
        return Err(LoadError::EmptyIdentity {
            path: path.to_path_buf(),
        });
    }
    Ok(identity.to_string())
}
