use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
};
use chrono::Local;
use reserveit_core::page::{FormPageContext, PageTemplate, Renderer};

use super::AppError;
use crate::state::ResourceState;

/// Show a resource's reservation form (GET `<prefix>/`).
///
/// htmx requests get the forms alone; browsers get the full page.
pub async fn show_form(
    State(state): State<ResourceState>,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let bundle = &state.bundle;
    let context = FormPageContext::build(
        Arc::clone(&bundle.resource),
        &bundle.routes,
        &state.app,
        "",
        Local::now().date_naive(),
    );

    let template = if headers.contains_key("hx-request") {
        PageTemplate::FormFragment
    } else {
        PageTemplate::FormPage
    };
    let html = state.renderer.render(template, &context)?;

    Ok(Html(html))
}
