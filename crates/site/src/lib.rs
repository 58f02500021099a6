//! Static reservation pages.
//!
//! [`ReservationPagesPlugin`] takes part in a site build through the
//! [`SitePlugin`] hooks and contributes one generated page per resource.
//! [`DirectoryHost`] is a small host that runs those hooks over a directory
//! of markdown.

pub mod assets;
mod builder;
mod document;
mod error;
mod host;
mod plugin;
mod render;

pub use builder::{BuildReport, DirectoryHost, PLUGIN_NAME};
pub use document::{DocumentCache, VirtualDocument};
pub use error::{PluginError, Result};
pub use host::{Files, HostConfig, Page, SiteFile, SitePlugin, TemplateEnv};
pub use plugin::{PluginOptions, ReservationPagesPlugin, REQUIRED_EXTENSIONS};
pub use render::MarkdownRenderer;
