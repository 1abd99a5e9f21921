//! Test utilities and common setup.

use std::path::Path;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use boar::{AppState, Config, Settings};
use tower::ServiceExt;

/// Settings for serving `target`, with archives written to `archive_dir`.
pub fn test_settings(target: &Path, archive_dir: &Path) -> Settings {
    let config = Config {
        archive_dir: archive_dir.to_path_buf(),
        ..Config::default()
    };
    Settings::resolve(target, 0, Some("127.0.0.1"), false, false, config).unwrap()
}

/// Prepare the target and build a router for it.
pub fn test_app(settings: Settings) -> (Router, AppState) {
    let state = AppState::prepare(settings).unwrap();
    (boar::routes::router(state.clone()), state)
}

/// Send a GET request to the router.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri).await
}

/// Send a bodiless request with any method to the router.
pub async fn send(app: &Router, method: Method, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .method(method)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Collect a response body.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
