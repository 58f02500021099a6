//! The site host's side of the plugin contract.
//!
//! A host discovers documentation files, asks plugins for page sources,
//! renders pages and writes them to the site directory. Plugins take part
//! through the [`SitePlugin`] hooks, called in this order: `on_config`,
//! `on_files`, `on_env`, `on_page_read_source` per page, `on_post_build`
//! and finally `on_shutdown`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Site-wide settings shared between the host and its plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub site_name: String,
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,
    #[serde(default = "default_use_directory_urls")]
    pub use_directory_urls: bool,
    #[serde(default)]
    pub extra_javascript: Vec<String>,
    #[serde(default)]
    pub extra_css: Vec<String>,
    #[serde(default)]
    pub markdown_extensions: Vec<String>,
    /// Per-extension settings, keyed by extension name.
    #[serde(default)]
    pub mdx_configs: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("docs")
}

fn default_site_dir() -> PathBuf {
    PathBuf::from("site")
}

fn default_use_directory_urls() -> bool {
    true
}

impl HostConfig {
    pub fn new(docs_dir: impl Into<PathBuf>, site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_name: String::new(),
            docs_dir: docs_dir.into(),
            site_dir: site_dir.into(),
            use_directory_urls: default_use_directory_urls(),
            extra_javascript: Vec::new(),
            extra_css: Vec::new(),
            markdown_extensions: Vec::new(),
            mdx_configs: BTreeMap::new(),
        }
    }
}

/// A documentation source known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    /// Path relative to the docs directory, with `/` separators.
    pub src_path: String,
    /// Location on disk; `None` for virtual files supplied by a plugin.
    pub abs_src_path: Option<PathBuf>,
    pub dest_path: PathBuf,
    pub url: String,
}

impl SiteFile {
    /// A file backed by a document under `docs_dir`.
    pub fn on_disk(src_path: &str, config: &HostConfig) -> Self {
        let mut file = Self::virtual_page(src_path, config);
        file.abs_src_path = Some(config.docs_dir.join(src_path));
        file
    }

    /// A file with no on-disk source.
    pub fn virtual_page(src_path: &str, config: &HostConfig) -> Self {
        let (dest_path, url) = destination(src_path, &config.site_dir, config.use_directory_urls);
        Self {
            src_path: src_path.to_string(),
            abs_src_path: None,
            dest_path,
            url,
        }
    }

    pub fn is_virtual(&self) -> bool {
        self.abs_src_path.is_none()
    }

    pub fn is_markdown(&self) -> bool {
        self.src_path.ends_with(".md")
    }
}

fn destination(src_path: &str, site_dir: &Path, use_directory_urls: bool) -> (PathBuf, String) {
    let relative = Path::new(src_path).with_extension("");
    let stem = relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let relative_url = relative.to_string_lossy().replace('\\', "/");

    if stem == "index" {
        let parent = relative.parent().unwrap_or(Path::new(""));
        let url = parent.to_string_lossy().replace('\\', "/");
        let url = if url.is_empty() { String::new() } else { format!("{url}/") };
        (site_dir.join(parent).join("index.html"), url)
    } else if use_directory_urls {
        (
            site_dir.join(&relative).join("index.html"),
            format!("{relative_url}/"),
        )
    } else {
        (
            site_dir.join(relative.with_extension("html")),
            format!("{relative_url}.html"),
        )
    }
}

/// The host's file collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Files {
    files: Vec<SiteFile>,
}

impl Files {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any file with the same source path.
    pub fn append(&mut self, file: SiteFile) {
        self.files.retain(|existing| existing.src_path != file.src_path);
        self.files.push(file);
    }

    pub fn get(&self, src_path: &str) -> Option<&SiteFile> {
        self.files.iter().find(|file| file.src_path == src_path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SiteFile> {
        self.files.iter()
    }

    /// Markdown files, in insertion order.
    pub fn documentation_pages(&self) -> impl Iterator<Item = &SiteFile> {
        self.files.iter().filter(|file| file.is_markdown())
    }
}

/// A page about to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub file: SiteFile,
}

impl Page {
    pub fn new(file: SiteFile) -> Self {
        Self { file }
    }
}

/// Directories searched, in order, for page layouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateEnv {
    search_path: Vec<PathBuf>,
}

impl TemplateEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        self.search_path.push(dir.into());
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// First existing file called `name` on the search path.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}

/// Lifecycle hooks a site host calls on its plugins.
///
/// Every hook has a pass-through default so plugins implement only the
/// phases they take part in.
pub trait SitePlugin {
    fn on_config(&mut self, config: HostConfig) -> Result<HostConfig> {
        Ok(config)
    }

    fn on_files(&mut self, files: Files, _config: &HostConfig) -> Result<Files> {
        Ok(files)
    }

    fn on_env(&mut self, env: TemplateEnv, _config: &HostConfig, _files: &Files) -> TemplateEnv {
        env
    }

    /// Source text of `page`, or `None` to let the host read it from disk.
    fn on_page_read_source(&self, _page: &Page, _config: &HostConfig) -> Result<Option<String>> {
        Ok(None)
    }

    fn on_post_build(&mut self, _config: &HostConfig) -> Result<()> {
        Ok(())
    }

    fn on_shutdown(&mut self) {}
}
