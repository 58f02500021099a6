use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer,
};

use reserveit_core::routing::ResourceRoutes;
use reserveit_site::assets::default_asset_source_dir;

use crate::{
    handlers::{
        form::show_form,
        health::livez,
        home::home,
        reservations::{cancel, reserve},
    },
    state::{AppState, ResourceState},
};

/// Routes of one resource, at the paths its route plan assigned.
fn resource_router(routes: &ResourceRoutes) -> Router<ResourceState> {
    let mut router = Router::new()
        .route(&routes.form, get(show_form))
        .route(&routes.reserve, post(reserve))
        .route(&routes.cancel, post(cancel));
    if let Some(alias) = &routes.form_alias {
        router = router.route(alias, get(show_form));
    }

    tracing::debug!(
        form = %routes.form_name(),
        submit = %routes.submit_name(),
        cancel = %routes.cancel_name(),
        base = %routes.base,
        "Registered resource routes"
    );
    router
}

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let mut shared = Router::new().route("/livez", get(livez));
    if state.plan.has_home() {
        shared = shared.route("/", get(home));
    }

    let mut app: Router = shared.with_state(state.clone());
    for bundle in state.bundles.iter() {
        app = app.merge(resource_router(&bundle.routes).with_state(state.resource_state(bundle)));
    }

    app = app.nest_service("/static", ServeDir::new(default_asset_source_dir()));
    if let Some(dir) = &state.image_dir {
        app = app.nest_service("/images", ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ))
        .layer(CatchPanicLayer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request, response::Response};
    use chrono::{Local, NaiveTime, TimeDelta};
    use http_body_util::BodyExt;
    use reserveit_core::app_config::AppConfig;
    use reserveit_core::reservation::SchemaSelection;
    use reserveit_core::resource::{CalendarInfo, ResourceConfig, ResourceConfigSpec, ResourceMap};
    use tower::ServiceExt;

    use crate::bundle::{ResourceBundles, StorageBackend};
    use crate::calendar::InMemoryCalendar;
    use crate::config::ServerConfig;

    async fn state(identities: &[&str], calendar: &InMemoryCalendar) -> AppState {
        let mut resources = ResourceMap::new();
        for identity in identities {
            let mut spec = ResourceConfigSpec::new(*identity, identity.to_uppercase())
                .with_calendar("one", CalendarInfo::new(format!("{identity}-1@group")));
            spec.description = format!("All about {identity}");
            resources
                .insert(ResourceConfig::try_from(spec).unwrap())
                .unwrap();
        }
        let bundles = ResourceBundles::assemble(
            &resources,
            &SchemaSelection::default(),
            &StorageBackend::Memory,
        )
        .await
        .unwrap();

        AppState::new(
            AppConfig::new("desk@example.org", "UTC"),
            bundles,
            Arc::new(calendar.clone()),
            ServerConfig::default(),
        )
    }

    fn tomorrow() -> String {
        (Local::now().date_naive() + TimeDelta::days(1))
            .format("%Y-%m-%d")
            .to_string()
    }

    fn reservation_body() -> String {
        format!(
            "name=Ada&email=ada%40example.org&date={}&start_time=09%3A00+AM&end_time=10%3A00+AM",
            tomorrow()
        )
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: impl Into<String>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body.into()))
            .unwrap()
    }

    async fn text(response: Response) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn reservation_code(html: &str) -> String {
        html.split("<code>")
            .nth(1)
            .and_then(|rest| rest.split("</code>").next())
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_single_resource_is_mounted_at_root() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app.clone().oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = text(response).await;
        assert!(html.contains("<!doctype html>"));
        assert!(html.contains(r#"hx-post="/reserve""#));

        let response = app.clone().oneshot(get_request("/livez")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get_request("/courts/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_htmx_request_gets_fragment() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let request = Request::builder()
            .uri("/")
            .header("HX-Request", "true")
            .body(Body::empty())
            .unwrap();
        let html = text(app.oneshot(request).await.unwrap()).await;

        assert!(!html.contains("<!doctype html>"));
        assert!(html.contains(r#"name="start_time""#));
    }

    #[tokio::test]
    async fn test_several_resources_are_prefixed() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts", "rooms"], &calendar).await);

        let html = text(app.clone().oneshot(get_request("/")).await.unwrap()).await;
        assert!(html.contains(r#"href="/courts/""#));
        assert!(html.contains(r#"href="/rooms/""#));
        assert!(html.contains("All about rooms"));

        for uri in ["/courts/", "/courts", "/rooms/"] {
            let response = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }

        let response = app
            .clone()
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(post_form("/rooms/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reserve_creates_calendar_event() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = text(response).await;
        assert!(html.contains("Reservation confirmed"));
        assert!(html.contains("09:00 AM"));
        assert!(!html.contains("could not be created yet"));
        assert_eq!(calendar.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_form_is_422() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app
            .oneshot(post_form("/reserve", "email=not-an-email"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let html = text(response).await;
        assert!(html.contains("Name is required"));
        assert!(html.contains("Email address is not valid"));
        assert_eq!(calendar.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_second_overlapping_reservation_is_409() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let first = app
            .clone()
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_submits() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let (a, b) = tokio::join!(
            app.clone()
                .oneshot(post_form("/reserve", reservation_body())),
            app.oneshot(post_form("/reserve", reservation_body()))
        );
        let statuses = [a.unwrap().status(), b.unwrap().status()];

        assert!(statuses.contains(&StatusCode::OK));
        assert!(statuses.contains(&StatusCode::CONFLICT));
    }

    #[tokio::test]
    async fn test_remote_busy_interval_blocks_slot() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);
        let date = Local::now().date_naive() + TimeDelta::days(1);
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        calendar
            .block("courts-1@group", date.and_time(nine), date.and_time(eleven))
            .await;

        let response = app
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unavailable_calendar_is_503() {
        let calendar = InMemoryCalendar::new();
        calendar.set_unavailable(true);
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_cancel_removes_reservation_and_event() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let html = text(
            app.clone()
                .oneshot(post_form("/reserve", reservation_body()))
                .await
                .unwrap(),
        )
        .await;
        let code = reservation_code(&html);
        let cancel_body = format!("reservation_id={code}&email=ADA%40example.org");

        let response = app
            .clone()
            .oneshot(post_form("/cancel", cancel_body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains("Reservation cancelled"));
        assert_eq!(calendar.event_count().await, 0);

        let again = app
            .clone()
            .oneshot(post_form("/cancel", cancel_body))
            .await
            .unwrap();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);

        let rebook = app
            .oneshot(post_form("/reserve", reservation_body()))
            .await
            .unwrap();
        assert_eq!(rebook.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cancel_requires_booking_email() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let html = text(
            app.clone()
                .oneshot(post_form("/reserve", reservation_body()))
                .await
                .unwrap(),
        )
        .await;
        let code = reservation_code(&html);

        let response = app
            .oneshot(post_form(
                "/cancel",
                format!("reservation_id={code}&email=mallory%40example.org"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(calendar.event_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_with_malformed_code_is_422() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app
            .oneshot(post_form(
                "/cancel",
                "reservation_id=abc&email=ada%40example.org",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_static_assets_are_served() {
        let calendar = InMemoryCalendar::new();
        let app = create_app(state(&["courts"], &calendar).await);

        let response = app
            .oneshot(get_request("/static/reserve-it.css"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_images_served_when_configured() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("courts.jpg"), b"jpeg").unwrap();
        let calendar = InMemoryCalendar::new();
        let app = create_app(
            state(&["courts"], &calendar)
                .await
                .with_image_dir(dir.path()),
        );

        let response = app
            .oneshot(get_request("/images/courts.jpg"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "jpeg");
    }
}
