use askama::Template;
use axum::{extract::State, response::IntoResponse};

use super::HtmlTemplate;
use crate::state::AppState;

struct HomeEntry {
    name: String,
    emoji: String,
    description: String,
    href: String,
}

/// Listing of every resource, served at `/` when there are several.
#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    title: String,
    description: String,
    resources: Vec<HomeEntry>,
}

/// Handler for the home page (GET /).
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let resources = state
        .bundles
        .iter()
        .map(|bundle| HomeEntry {
            name: bundle.resource.resource_name.clone(),
            emoji: bundle.resource.emoji.clone(),
            description: bundle.resource.description.clone(),
            href: bundle.routes.form.clone(),
        })
        .collect();

    HtmlTemplate(HomeTemplate {
        title: state.app.title.clone(),
        description: state.app.description.clone(),
        resources,
    })
}
