//! A minimal site host that builds a directory of markdown into HTML.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use pulldown_cmark::{html as md_html, Options, Parser};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{PluginError, Result};
use crate::host::{Files, HostConfig, Page, SiteFile, SitePlugin, TemplateEnv};
use crate::plugin::{PluginOptions, ReservationPagesPlugin};

/// Layout used when a page names no template found on the search path.
const DEFAULT_LAYOUT: &str = r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{{ title }} | {{ site_name }}</title>
    {{ extra_css }}
  </head>
  <body>
{{ content }}
    {{ extra_javascript }}
  </body>
</html>
"#;

const DEFAULT_TEMPLATE: &str = "main.html";

/// Name of the reservation pages plugin in a site document.
pub const PLUGIN_NAME: &str = "reserve-it";

/// A site document: host settings plus per-plugin options.
#[derive(Debug, Deserialize)]
struct SiteDocument {
    #[serde(flatten)]
    host: HostConfig,
    #[serde(default)]
    plugins: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    template: Option<String>,
    title: Option<String>,
}

/// What a build produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    /// Written pages, in build order.
    pub pages: Vec<PathBuf>,
}

/// Drives its plugins through a full build of `docs_dir` into `site_dir`.
pub struct DirectoryHost {
    config: HostConfig,
    plugins: Vec<Box<dyn SitePlugin>>,
}

impl DirectoryHost {
    pub fn new(config: HostConfig) -> Self {
        Self {
            config,
            plugins: Vec::new(),
        }
    }

    pub fn with_plugin(mut self, plugin: impl SitePlugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Reads a site document, resolving relative paths against its directory.
    ///
    /// A `plugins.reserve-it` section installs [`ReservationPagesPlugin`].
    pub fn from_site_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| PluginError::io(path, err))?;
        let document: SiteDocument = serde_yaml::from_str(&text).map_err(|err| {
            PluginError::Configuration(format!("Invalid site file {}: {err}", path.display()))
        })?;
        let base = path.parent().unwrap_or(Path::new("."));

        let mut config = document.host;
        config.docs_dir = base.join(&config.docs_dir);
        config.site_dir = base.join(&config.site_dir);
        let mut host = Self::new(config);

        for (name, options) in document.plugins {
            if name != PLUGIN_NAME {
                tracing::warn!(plugin = %name, "Ignoring unknown plugin");
                continue;
            }
            let options: PluginOptions = serde_yaml::from_value(options).map_err(|err| {
                PluginError::Configuration(format!("Invalid {PLUGIN_NAME} options: {err}"))
            })?;
            host = host.with_plugin(ReservationPagesPlugin::new(options.relative_to(base)));
        }
        Ok(host)
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Runs every build phase, then shuts the plugins down whatever happened.
    pub fn build(&mut self) -> Result<BuildReport> {
        let result = self.run_phases();
        for plugin in &mut self.plugins {
            plugin.on_shutdown();
        }
        match &result {
            Ok(report) => tracing::info!(
                pages = report.pages.len(),
                site_dir = %self.config.site_dir.display(),
                "Site built"
            ),
            Err(err) => tracing::error!(error = %err, "Site build failed"),
        }
        result
    }

    fn run_phases(&mut self) -> Result<BuildReport> {
        let mut config = self.config.clone();
        for plugin in &mut self.plugins {
            config = plugin.on_config(config)?;
        }

        let mut files = discover(&config)?;
        for plugin in &mut self.plugins {
            files = plugin.on_files(files, &config)?;
        }

        let mut env = TemplateEnv::new();
        for plugin in &mut self.plugins {
            env = plugin.on_env(env, &config, &files);
        }

        let mut report = BuildReport::default();
        for file in files.documentation_pages() {
            let page = Page::new(file.clone());
            let source = self.read_source(&page, &config)?;
            let html = render_page(&source, &page, &config, &env)?;

            let dest = &page.file.dest_path;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|err| PluginError::io(parent, err))?;
            }
            fs::write(dest, html).map_err(|err| PluginError::io(dest, err))?;
            tracing::debug!(page = %page.file.src_path, dest = %dest.display(), "Wrote page");
            report.pages.push(dest.clone());
        }

        for plugin in &mut self.plugins {
            plugin.on_post_build(&config)?;
        }

        self.config = config;
        Ok(report)
    }

    fn read_source(&self, page: &Page, config: &HostConfig) -> Result<String> {
        for plugin in &self.plugins {
            if let Some(source) = plugin.on_page_read_source(page, config)? {
                return Ok(source);
            }
        }
        match &page.file.abs_src_path {
            Some(path) => fs::read_to_string(path).map_err(|err| PluginError::io(path, err)),
            None => Err(PluginError::Configuration(format!(
                "No plugin supplied content for virtual page '{}'",
                page.file.src_path
            ))),
        }
    }
}

/// Markdown files under `docs_dir`, in path order.
fn discover(config: &HostConfig) -> Result<Files> {
    let mut files = Files::new();
    if !config.docs_dir.is_dir() {
        tracing::debug!(docs_dir = %config.docs_dir.display(), "No docs directory");
        return Ok(files);
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(&config.docs_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    paths.sort();

    for path in paths {
        let Ok(relative) = path.strip_prefix(&config.docs_dir) else {
            continue;
        };
        let src_path = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.append(SiteFile::on_disk(&src_path, config));
    }
    Ok(files)
}

/// Splits YAML front matter from the markdown body.
fn split_front_matter<'a>(source: &'a str, src_path: &str) -> Result<(FrontMatter, &'a str)> {
    let Some(rest) = source.strip_prefix("---\n") else {
        return Ok((FrontMatter::default(), source));
    };
    let (yaml, body) = match rest.find("\n---") {
        Some(end) => {
            let after = &rest[end + 4..];
            (&rest[..end], after.strip_prefix('\n').unwrap_or(after))
        }
        None => return Ok((FrontMatter::default(), source)),
    };
    let front_matter = serde_yaml::from_str(yaml).map_err(|source| PluginError::FrontMatter {
        path: src_path.to_string(),
        source,
    })?;
    Ok((front_matter, body))
}

fn render_page(source: &str, page: &Page, config: &HostConfig, env: &TemplateEnv) -> Result<String> {
    let (front_matter, body) = split_front_matter(source, &page.file.src_path)?;

    let mut content = String::new();
    md_html::push_html(
        &mut content,
        Parser::new_ext(body, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH),
    );

    let layout = match env.find(front_matter.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)) {
        Some(path) => fs::read_to_string(&path).map_err(|err| PluginError::io(&path, err))?,
        None => DEFAULT_LAYOUT.to_string(),
    };

    let root = relative_root(&page.file.url);
    let title = front_matter.title.unwrap_or_else(|| page_title(body, &page.file.src_path));
    let extra_css = config
        .extra_css
        .iter()
        .map(|href| format!(r#"<link rel="stylesheet" href="{}">"#, link(&root, href)))
        .collect::<Vec<_>>()
        .join("\n    ");
    let extra_javascript = config
        .extra_javascript
        .iter()
        .map(|src| format!(r#"<script src="{}"></script>"#, link(&root, src)))
        .collect::<Vec<_>>()
        .join("\n    ");
    let home_url = if root.is_empty() { "./".to_string() } else { root.clone() };

    Ok(layout
        .replace("{{ title }}", &title)
        .replace("{{ site_name }}", &config.site_name)
        .replace("{{ extra_css }}", &extra_css)
        .replace("{{ extra_javascript }}", &extra_javascript)
        .replace("{{ home_url }}", &home_url)
        .replace("{{ content }}", &content))
}

/// Path from a page URL back to the site root, such as `../` for `courts/`.
fn relative_root(url: &str) -> String {
    "../".repeat(url.matches('/').count())
}

fn link(root: &str, href: &str) -> String {
    if href.starts_with('/') || href.contains("://") {
        href.to_string()
    } else {
        format!("{root}{href}")
    }
}

/// First level-one heading, or the file stem.
fn page_title(body: &str, src_path: &str) -> String {
    body.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .unwrap_or_else(|| {
            Path::new(src_path)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}
