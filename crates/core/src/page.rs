//! Form page context and the render contract shared by the live app and the
//! static site.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::app_config::AppConfig;
use crate::resource::{CustomFormField, ResourceConfig};
use crate::routing::ResourceRoutes;

/// The page a renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTemplate {
    /// A complete document: title, description, image, calendar view and forms.
    FormPage,
    /// The reservation and cancellation forms alone.
    FormFragment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Failed to render {template:?}: {message}")]
    Template {
        template: PageTemplate,
        message: String,
    },
}

/// Renders a form page context to text.
pub trait Renderer: Send + Sync {
    fn render(&self, template: PageTemplate, context: &FormPageContext)
        -> Result<String, RenderError>;
}

/// A custom form field prepared for templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    pub title: String,
    /// Extra attributes as `(name, value)` pairs, ready to print.
    pub attributes: Vec<(String, String)>,
}

impl From<&CustomFormField> for FieldView {
    fn from(field: &CustomFormField) -> Self {
        let attributes = field
            .attributes
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::Null | serde_json::Value::Bool(false) => return None,
                    serde_json::Value::Bool(true) => key.clone(),
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), text))
            })
            .collect();

        Self {
            name: field.name.clone(),
            label: field.label.clone(),
            kind: field.kind.to_string(),
            required: field.required,
            title: field.title.clone(),
            attributes,
        }
    }
}

/// An image prepared for templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub src: String,
    pub caption: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Everything needed to render one resource's form page.
#[derive(Debug, Clone)]
pub struct FormPageContext {
    pub resource: Arc<ResourceConfig>,
    pub site_title: String,
    pub title: String,
    pub time_slots: Vec<String>,
    /// Custom fields as plain key/value maps.
    pub custom_form_fields: Vec<BTreeMap<String, serde_json::Value>>,
    pub fields: Vec<FieldView>,
    pub reserve_action: String,
    pub cancel_action: String,
    pub calendar_shown: bool,
    pub calendar_embed_url: Option<String>,
    pub image: Option<ImageView>,
    /// Earliest selectable date, `YYYY-MM-DD`.
    pub min_date: String,
    /// Latest selectable date, when the resource bounds it.
    pub max_date: Option<String>,
}

impl FormPageContext {
    /// Builds the context for `resource`.
    ///
    /// Form actions are `api_base` joined with the resource's planned paths,
    /// so a static page posts to the same routes the live app serves.
    pub fn build(
        resource: Arc<ResourceConfig>,
        routes: &ResourceRoutes,
        app: &AppConfig,
        api_base: &str,
        today: NaiveDate,
    ) -> Self {
        let api_base = api_base.trim_end_matches('/');
        let calendar_shown = resource.calendar_shown_final();
        let calendar_embed_url =
            calendar_shown.then(|| calendar_embed_url(&resource, &app.timezone));
        let image = resource.image.as_ref().and_then(|image| {
            image.file_name().map(|name| ImageView {
                src: format!("{api_base}/images/{name}"),
                caption: image.caption.clone(),
                width: image.pixel_width,
                height: image.pixel_height,
            })
        });
        let max_date = resource
            .latest_bookable_date(today)
            .map(|date| date.format("%Y-%m-%d").to_string());

        Self {
            site_title: app.title.clone(),
            title: resource.display_title(),
            time_slots: resource.formatted_time_slots(),
            custom_form_fields: resource
                .custom_form_fields
                .iter()
                .map(CustomFormField::to_map)
                .collect(),
            fields: resource
                .custom_form_fields
                .iter()
                .map(FieldView::from)
                .collect(),
            reserve_action: format!("{api_base}{}", routes.reserve),
            cancel_action: format!("{api_base}{}", routes.cancel),
            calendar_shown,
            calendar_embed_url,
            image,
            min_date: today.format("%Y-%m-%d").to_string(),
            max_date,
            resource,
        }
    }
}

/// Embed URL of the combined calendar view.
fn calendar_embed_url(resource: &ResourceConfig, timezone: &str) -> String {
    let mut url = format!(
        "https://calendar.google.com/calendar/embed?ctz={}&mode=WEEK",
        urlencoding::encode(timezone)
    );
    for info in resource.calendars.values() {
        url.push_str("&src=");
        url.push_str(&urlencoding::encode(&info.id));
        if let Some(color) = &info.color {
            url.push_str("&color=");
            url.push_str(&urlencoding::encode(color));
        }
    }
    url
}
