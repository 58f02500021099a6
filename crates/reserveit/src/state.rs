//! Shared application state.
//!
//! `AppState` serves the application-wide routes. Each resource's routes get
//! a `ResourceState` carrying that resource's bundle, so a handler never
//! looks a resource up at request time.

use std::path::PathBuf;
use std::sync::Arc;

use reserveit_core::app_config::AppConfig;
use reserveit_core::calendar::CalendarService;
use reserveit_core::routing::RoutePlan;

use crate::bundle::{close_stores, ResourceBundle, ResourceBundles};
use crate::config::ServerConfig;
use crate::render::HtmlRenderer;

/// Application-wide state, cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    pub app: Arc<AppConfig>,
    pub plan: Arc<RoutePlan>,
    pub bundles: Arc<Vec<Arc<ResourceBundle>>>,
    pub calendar: Arc<dyn CalendarService>,
    pub renderer: HtmlRenderer,
    pub config: ServerConfig,
    /// Directory served under `/images`, if any.
    pub image_dir: Option<PathBuf>,
}

/// State of one resource's routes.
#[derive(Clone)]
pub struct ResourceState {
    pub app: Arc<AppConfig>,
    pub bundle: Arc<ResourceBundle>,
    pub calendar: Arc<dyn CalendarService>,
    pub renderer: HtmlRenderer,
}

impl AppState {
    pub fn new(
        app: AppConfig,
        bundles: ResourceBundles,
        calendar: Arc<dyn CalendarService>,
        config: ServerConfig,
    ) -> Self {
        Self {
            app: Arc::new(app),
            plan: Arc::new(bundles.plan),
            bundles: Arc::new(bundles.bundles),
            calendar,
            renderer: HtmlRenderer,
            config,
            image_dir: None,
        }
    }

    /// Serves `dir` under `/images`.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }

    pub fn resource_state(&self, bundle: &Arc<ResourceBundle>) -> ResourceState {
        ResourceState {
            app: Arc::clone(&self.app),
            bundle: Arc::clone(bundle),
            calendar: Arc::clone(&self.calendar),
            renderer: self.renderer,
        }
    }

    /// Releases every bundle's store.
    pub async fn close(&self) {
        close_stores(&self.bundles).await;
    }
}
