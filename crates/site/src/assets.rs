use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PluginError, Result};

/// Stylesheets shipped with this crate and copied into every built site.
pub const DECLARED_ASSETS: [&str; 2] = ["reserve-it.css", "theme-tweaks.css"];

/// Output location of the assets, relative to the site directory.
pub const ASSET_OUTPUT_DIR: &str = "assets/reserve-it";

/// Script the generated forms post through.
pub const HTMX_SCRIPT: &str = "https://unpkg.com/htmx.org@1.9.12";

/// Layouts the generated pages name in their front matter.
pub const HOST_TEMPLATES: [(&str, &str); 1] = [(
    "ri-form.html",
    include_str!("../host_templates/ri-form.html"),
)];

/// Directory the packaged assets are read from by default.
pub fn default_asset_source_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"))
}

/// Stylesheet references as they appear in the host's `extra_css`.
pub fn stylesheet_refs() -> Vec<String> {
    DECLARED_ASSETS
        .iter()
        .map(|name| format!("{ASSET_OUTPUT_DIR}/{name}"))
        .collect()
}

/// Checks that every declared asset exists under `source_dir`.
pub fn verify_assets(source_dir: &Path) -> Result<()> {
    for name in DECLARED_ASSETS {
        let path = source_dir.join(name);
        if !path.is_file() {
            return Err(PluginError::AssetMissing(path));
        }
    }
    Ok(())
}

/// Copies every declared asset into `<site_dir>/assets/reserve-it/`.
///
/// Nothing is copied unless all declared assets are present.
pub fn copy_assets(source_dir: &Path, site_dir: &Path) -> Result<Vec<PathBuf>> {
    verify_assets(source_dir)?;

    let target_dir = site_dir.join(ASSET_OUTPUT_DIR);
    fs::create_dir_all(&target_dir).map_err(|err| PluginError::io(&target_dir, err))?;

    let mut copied = Vec::with_capacity(DECLARED_ASSETS.len());
    for name in DECLARED_ASSETS {
        let from = source_dir.join(name);
        let to = target_dir.join(name);
        fs::copy(&from, &to).map_err(|err| PluginError::io(&from, err))?;
        tracing::debug!(asset = name, to = %to.display(), "Copied asset");
        copied.push(to);
    }
    Ok(copied)
}

/// Writes the packaged host templates into `dir`.
pub fn extract_host_templates(dir: &Path) -> Result<()> {
    for (name, contents) in HOST_TEMPLATES {
        let path = dir.join(name);
        fs::write(&path, contents).map_err(|err| PluginError::io(&path, err))?;
    }
    Ok(())
}
