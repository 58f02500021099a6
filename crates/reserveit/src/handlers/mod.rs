pub mod error;
pub mod form;
pub mod health;
pub mod home;
pub mod reservations;

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub use error::AppError;

/// Template wrapper that converts Askama templates into HTML responses.
pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {err}"),
            )
                .into_response(),
        }
    }
}

/// A short notice: a heading and optional detail lines.
#[derive(Template)]
#[template(path = "message.html")]
pub struct MessageTemplate {
    class: &'static str,
    heading: String,
    messages: Vec<String>,
}

impl MessageTemplate {
    pub fn success(heading: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            class: "ri-success",
            heading: heading.into(),
            messages,
        }
    }

    pub fn error(heading: impl Into<String>, messages: Vec<String>) -> Self {
        Self {
            class: "ri-error",
            heading: heading.into(),
            messages,
        }
    }
}
