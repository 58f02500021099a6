//! The reservation pages plugin.
//!
//! Holds everything it learns during a build in its own fields, so a host
//! can construct as many instances as it likes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use reserveit_config::{is_yaml, load_app_config, load_resources};
use reserveit_core::app_config::AppConfig;
use reserveit_core::page::{FormPageContext, PageTemplate, Renderer};
use reserveit_core::resource::ResourceMap;
use reserveit_core::routing::RoutePlan;
use serde::Deserialize;
use serde_json::json;
use tempfile::TempDir;

use crate::assets::{
    copy_assets, default_asset_source_dir, extract_host_templates, stylesheet_refs, HTMX_SCRIPT,
};
use crate::document::{DocumentCache, VirtualDocument};
use crate::error::{PluginError, Result};
use crate::host::{Files, HostConfig, Page, SiteFile, SitePlugin, TemplateEnv};
use crate::render::MarkdownRenderer;

/// Markdown extensions the generated pages rely on.
pub const REQUIRED_EXTENSIONS: [&str; 3] = ["attr_list", "md_in_html", "pymdownx.emoji"];

const EMOJI_EXTENSION: &str = "pymdownx.emoji";

/// Options read from the host's plugin configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginOptions {
    pub app_config: PathBuf,
    pub resource_config_dir: PathBuf,
    #[serde(default = "default_assets_enabled")]
    pub assets_enabled: bool,
    /// Prefix for form actions, such as the live app's public URL.
    #[serde(default)]
    pub api_base: String,
    /// Where the packaged assets are read from; the crate's own by default.
    #[serde(default)]
    pub asset_source_dir: Option<PathBuf>,
}

fn default_assets_enabled() -> bool {
    true
}

impl PluginOptions {
    pub fn new(app_config: impl Into<PathBuf>, resource_config_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_config: app_config.into(),
            resource_config_dir: resource_config_dir.into(),
            assets_enabled: default_assets_enabled(),
            api_base: String::new(),
            asset_source_dir: None,
        }
    }

    /// Resolves relative paths against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        self.app_config = base.join(&self.app_config);
        self.resource_config_dir = base.join(&self.resource_config_dir);
        self.asset_source_dir = self.asset_source_dir.map(|dir| base.join(dir));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !is_yaml(&self.app_config) {
            return Err(PluginError::Configuration(format!(
                "app_config must be a .yaml or .yml file, got {}",
                self.app_config.display()
            )));
        }
        if !self.app_config.is_file() {
            return Err(PluginError::Configuration(format!(
                "app_config {} does not exist",
                self.app_config.display()
            )));
        }
        if !self.resource_config_dir.is_dir() {
            return Err(PluginError::Configuration(format!(
                "resource_config_dir {} is not a directory",
                self.resource_config_dir.display()
            )));
        }
        Ok(())
    }

    fn asset_source_dir(&self) -> PathBuf {
        self.asset_source_dir
            .clone()
            .unwrap_or_else(default_asset_source_dir)
    }
}

/// Configuration loaded during `on_config`.
#[derive(Debug)]
struct Loaded {
    app: AppConfig,
    resources: ResourceMap,
    plan: RoutePlan,
}

/// Generates one form page per configured resource.
#[derive(Debug)]
pub struct ReservationPagesPlugin {
    options: PluginOptions,
    renderer: MarkdownRenderer,
    today: Option<NaiveDate>,
    loaded: Option<Loaded>,
    documents: DocumentCache,
    template_dir: Option<TempDir>,
}

impl ReservationPagesPlugin {
    pub fn new(options: PluginOptions) -> Self {
        Self {
            options,
            renderer: MarkdownRenderer,
            today: None,
            loaded: None,
            documents: DocumentCache::new(),
            template_dir: None,
        }
    }

    /// Fixes the date the forms treat as today.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Paths of the registered virtual documents.
    pub fn document_paths(&self) -> impl Iterator<Item = &str> {
        self.documents.paths()
    }

    /// Directory holding the extracted host templates, while the build runs.
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_ref().map(TempDir::path)
    }

    /// Content of a registered virtual document, rendered on first request.
    ///
    /// Returns `None` for paths this plugin did not register.
    pub fn page_source(&self, path: &str) -> Result<Option<&str>> {
        let Some(document) = self.documents.get(path) else {
            return Ok(None);
        };
        document
            .content_or_try_render(|identity| self.render_document(path, identity))
            .map(Some)
    }

    fn render_document(&self, path: &str, identity: &str) -> Result<String> {
        let unknown = || PluginError::UnknownResource {
            path: path.to_string(),
            resource: identity.to_string(),
        };
        let loaded = self.loaded.as_ref().ok_or_else(unknown)?;
        let resource = loaded.resources.get(identity).ok_or_else(unknown)?;
        let routes = loaded.plan.for_resource(identity).ok_or_else(unknown)?;

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let context = FormPageContext::build(
            Arc::clone(resource),
            routes,
            &loaded.app,
            &self.options.api_base,
            today,
        );
        let content = self
            .renderer
            .render(PageTemplate::FormPage, &context)
            .map_err(|source| PluginError::Render {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!(path, resource = identity, "Rendered virtual page");
        Ok(content)
    }

    fn load(&self) -> Result<Loaded> {
        self.options.validate()?;
        let app = load_app_config(&self.options.app_config)?;
        let resources = load_resources(&self.options.resource_config_dir, &app)?;
        let plan = RoutePlan::plan(&resources)
            .map_err(|err| PluginError::Configuration(err.to_string()))?;
        Ok(Loaded {
            app,
            resources,
            plan,
        })
    }

    fn ensure_template_dir(&mut self) -> Result<()> {
        if self.template_dir.is_some() {
            return Ok(());
        }
        let dir = tempfile::Builder::new()
            .prefix("reserve-it-templates-")
            .tempdir()
            .map_err(|err| PluginError::io(std::env::temp_dir(), err))?;
        extract_host_templates(dir.path())?;
        tracing::debug!(dir = %dir.path().display(), "Extracted host templates");
        self.template_dir = Some(dir);
        Ok(())
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

impl SitePlugin for ReservationPagesPlugin {
    fn on_config(&mut self, mut config: HostConfig) -> Result<HostConfig> {
        let loaded = self.load().inspect_err(|err| {
            tracing::error!(error = %err, "Invalid reservation page configuration");
        })?;

        config.site_name = loaded.app.title.clone();

        for extension in REQUIRED_EXTENSIONS {
            push_unique(&mut config.markdown_extensions, extension);
        }
        let emoji = config
            .mdx_configs
            .entry(EMOJI_EXTENSION.to_string())
            .or_default();
        emoji
            .entry("emoji_index".to_string())
            .or_insert_with(|| json!("material.extensions.emoji.twemoji"));
        emoji
            .entry("emoji_generator".to_string())
            .or_insert_with(|| json!("material.extensions.emoji.to_svg"));

        if self.options.assets_enabled {
            for stylesheet in stylesheet_refs() {
                push_unique(&mut config.extra_css, &stylesheet);
            }
        }
        push_unique(&mut config.extra_javascript, HTMX_SCRIPT);

        self.ensure_template_dir()?;

        tracing::info!(
            resources = loaded.resources.len(),
            topology = ?loaded.plan.topology,
            "Configured reservation pages"
        );
        self.loaded = Some(loaded);
        Ok(config)
    }

    fn on_files(&mut self, mut files: Files, config: &HostConfig) -> Result<Files> {
        let Some(loaded) = &self.loaded else {
            return Ok(files);
        };

        for resource in &loaded.resources {
            let document = self
                .documents
                .register(VirtualDocument::for_resource(&resource.file_prefix));
            if files.get(document.path()).is_some_and(|file| !file.is_virtual()) {
                tracing::warn!(
                    path = document.path(),
                    "Virtual page replaces a file in docs_dir"
                );
            }
            files.append(SiteFile::virtual_page(document.path(), config));
        }
        Ok(files)
    }

    fn on_env(&mut self, mut env: TemplateEnv, _config: &HostConfig, _files: &Files) -> TemplateEnv {
        if let Some(dir) = self.template_dir() {
            if !env.search_path().iter().any(|existing| existing == dir) {
                env.add_dir(dir);
            }
        }
        env
    }

    fn on_page_read_source(&self, page: &Page, _config: &HostConfig) -> Result<Option<String>> {
        Ok(self.page_source(&page.file.src_path)?.map(str::to_string))
    }

    fn on_post_build(&mut self, config: &HostConfig) -> Result<()> {
        if !self.options.assets_enabled {
            return Ok(());
        }
        let copied = copy_assets(&self.options.asset_source_dir(), &config.site_dir)?;
        tracing::info!(
            count = copied.len(),
            site_dir = %config.site_dir.display(),
            "Copied reservation page assets"
        );
        Ok(())
    }

    fn on_shutdown(&mut self) {
        if let Some(dir) = self.template_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                tracing::warn!(dir = %path.display(), error = %err, "Failed to remove template directory");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const APP: &str = "app_email: club@example.org\ntimezone: UTC\ntitle: Club Reservations\n";

    const COURTS: &str = r#"
resource_name: Tennis Courts
calendars:
  court-1: { id: c1@group }
day_start_time: "08:00 AM"
day_end_time: "10:00 AM"
"#;

    const ROOMS: &str = r#"
resource_name: Meeting Rooms
calendars:
  room-a: { id: ra@group }
"#;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("app.yaml"), APP).unwrap();
            fs::create_dir(dir.path().join("resources")).unwrap();
            fs::write(dir.path().join("resources/1-courts.yaml"), COURTS).unwrap();
            fs::write(dir.path().join("resources/2-rooms.yaml"), ROOMS).unwrap();
            Self { dir }
        }

        fn options(&self) -> PluginOptions {
            PluginOptions::new("app.yaml", "resources").relative_to(self.dir.path())
        }

        fn host_config(&self) -> HostConfig {
            HostConfig::new(self.dir.path().join("docs"), self.dir.path().join("site"))
        }

        fn plugin(&self) -> ReservationPagesPlugin {
            ReservationPagesPlugin::new(self.options())
                .with_today(NaiveDate::from_ymd_opt(2030, 5, 1).unwrap())
        }

        /// Runs the configuration and discovery phases.
        fn configured(&self) -> (ReservationPagesPlugin, HostConfig, Files) {
            let mut plugin = self.plugin();
            let config = plugin.on_config(self.host_config()).unwrap();
            let files = plugin.on_files(Files::new(), &config).unwrap();
            (plugin, config, files)
        }
    }

    fn page(src_path: &str, config: &HostConfig) -> Page {
        Page::new(SiteFile::virtual_page(src_path, config))
    }

    #[test]
    fn test_on_config_injects_once() {
        let fixture = Fixture::new();
        let mut plugin = fixture.plugin();

        let once = plugin.on_config(fixture.host_config()).unwrap();
        let twice = plugin.on_config(once.clone()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.site_name, "Club Reservations");
        assert_eq!(twice.markdown_extensions, REQUIRED_EXTENSIONS);
        assert_eq!(twice.extra_css, stylesheet_refs());
        assert_eq!(twice.extra_javascript, vec![HTMX_SCRIPT]);
        assert_eq!(
            twice.mdx_configs[EMOJI_EXTENSION]["emoji_index"],
            json!("material.extensions.emoji.twemoji")
        );
    }

    #[test]
    fn test_on_config_keeps_existing_entries() {
        let fixture = Fixture::new();
        let mut config = fixture.host_config();
        config.markdown_extensions = vec!["toc".to_string(), "attr_list".to_string()];
        config.extra_css = vec!["custom.css".to_string()];

        let config = fixture.plugin().on_config(config).unwrap();
        assert_eq!(
            config.markdown_extensions,
            vec!["toc", "attr_list", "md_in_html", "pymdownx.emoji"]
        );
        assert_eq!(config.extra_css[0], "custom.css");
        assert_eq!(config.extra_css.len(), 3);
    }

    #[test]
    fn test_on_config_reports_configuration_error() {
        let fixture = Fixture::new();
        fs::write(
            fixture.dir.path().join("resources/3-bad.yaml"),
            "resource_name: Bad\ncalendars: {}\n",
        )
        .unwrap();

        let error = fixture.plugin().on_config(fixture.host_config()).unwrap_err();
        assert!(error.is_configuration());
        assert!(error.to_string().contains("3-bad.yaml"));
    }

    #[test]
    fn test_options_must_name_yaml_app_config() {
        let fixture = Fixture::new();
        let mut options = fixture.options();
        options.app_config = fixture.dir.path().join("app.toml");

        let error = ReservationPagesPlugin::new(options)
            .on_config(fixture.host_config())
            .unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_options_from_yaml() {
        let options: PluginOptions = serde_yaml::from_str(
            "app_config: app.yaml\nresource_config_dir: resources\napi_base: https://book.example.org\n",
        )
        .unwrap();
        assert!(options.assets_enabled);
        assert_eq!(options.api_base, "https://book.example.org");
        assert_eq!(options.asset_source_dir, None);
    }

    #[test]
    fn test_on_files_registers_one_page_per_resource() {
        let fixture = Fixture::new();
        let (plugin, _config, files) = fixture.configured();

        assert_eq!(
            plugin.document_paths().collect::<Vec<_>>(),
            vec!["courts.md", "rooms.md"]
        );
        let courts = files.get("courts.md").unwrap();
        assert!(courts.is_virtual());
        assert_eq!(courts.url, "courts/");
        assert!(!fixture.dir.path().join("docs").exists());
    }

    #[test]
    fn test_on_env_adds_template_dir_once() {
        let fixture = Fixture::new();
        let (mut plugin, config, files) = fixture.configured();

        let env = plugin.on_env(TemplateEnv::new(), &config, &files);
        let env = plugin.on_env(env, &config, &files);

        assert_eq!(env.search_path().len(), 1);
        assert!(env.find("ri-form.html").is_some());
    }

    #[test]
    fn test_page_source_is_memoized() {
        let fixture = Fixture::new();
        let (plugin, config, _files) = fixture.configured();

        let first = plugin.page_source("courts.md").unwrap().unwrap();
        let second = plugin.page_source("courts.md").unwrap().unwrap();
        assert_eq!(first.as_ptr(), second.as_ptr());
        assert!(first.contains("# Tennis Courts"));
        assert!(first.contains(r#"hx-post="/courts/reserve""#));
        assert!(first.contains(r#"min="2030-05-01""#));

        let via_hook = plugin
            .on_page_read_source(&page("courts.md", &config), &config)
            .unwrap();
        assert_eq!(via_hook.as_deref(), Some(first));
    }

    #[test]
    fn test_unregistered_path_is_not_ours() {
        let fixture = Fixture::new();
        let (plugin, config, _files) = fixture.configured();

        assert_eq!(
            plugin
                .on_page_read_source(&page("index.md", &config), &config)
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_vanished_resource_is_an_error() {
        let fixture = Fixture::new();
        let (mut plugin, _config, _files) = fixture.configured();

        let loaded = plugin.loaded.as_mut().unwrap();
        let mut remaining = ResourceMap::new();
        for resource in &loaded.resources {
            if resource.file_prefix != "rooms" {
                remaining.insert((**resource).clone()).unwrap();
            }
        }
        loaded.resources = remaining;

        assert!(matches!(
            plugin.page_source("rooms.md"),
            Err(PluginError::UnknownResource { resource, .. }) if resource == "rooms"
        ));
    }

    #[test]
    fn test_post_build_copies_assets() {
        let fixture = Fixture::new();
        let (mut plugin, config, _files) = fixture.configured();

        plugin.on_post_build(&config).unwrap();
        assert!(config
            .site_dir
            .join("assets/reserve-it/reserve-it.css")
            .is_file());
    }

    #[test]
    fn test_post_build_fails_on_missing_asset() {
        let fixture = Fixture::new();
        let empty = TempDir::new().unwrap();
        let mut options = fixture.options();
        options.asset_source_dir = Some(empty.path().to_path_buf());
        let mut plugin = ReservationPagesPlugin::new(options);
        let config = plugin.on_config(fixture.host_config()).unwrap();

        assert!(matches!(
            plugin.on_post_build(&config),
            Err(PluginError::AssetMissing(_))
        ));
    }

    #[test]
    fn test_assets_disabled() {
        let fixture = Fixture::new();
        let mut options = fixture.options();
        options.assets_enabled = false;
        options.asset_source_dir = Some(fixture.dir.path().join("nowhere"));
        let mut plugin = ReservationPagesPlugin::new(options);

        let config = plugin.on_config(fixture.host_config()).unwrap();
        assert!(config.extra_css.is_empty());
        plugin.on_post_build(&config).unwrap();
        assert!(!config.site_dir.exists());
    }

    #[test]
    fn test_shutdown_removes_template_dir() {
        let fixture = Fixture::new();
        let (mut plugin, _config, _files) = fixture.configured();
        let dir = plugin.template_dir().unwrap().to_path_buf();
        assert!(dir.is_dir());

        plugin.on_shutdown();
        assert!(!dir.exists());
        assert!(plugin.template_dir().is_none());
    }

    #[test]
    fn test_instances_are_independent() {
        let fixture = Fixture::new();
        let (first, _, _) = fixture.configured();
        let second = fixture.plugin();

        assert_eq!(first.document_paths().count(), 2);
        assert_eq!(second.document_paths().count(), 0);
        assert_eq!(second.page_source("courts.md").unwrap(), None);
    }
}
