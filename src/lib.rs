use std::{future::Future, net::SocketAddr, path::Path, time::Duration};

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{info, warn};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod registry;

use errors::AppError;
use registry::ConnectionRegistry;

#[derive(Clone, Default)]
pub struct AppState {
    pub registry: ConnectionRegistry,
}

impl AppState {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }
}

pub fn build_app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/mcp", get(http::handlers::mcp_socket))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then gives open connections `grace` to
/// finish before severing the rest.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    static_dir: impl AsRef<Path>,
    shutdown: impl Future<Output = ()> + Send + 'static,
    grace: Duration,
) -> Result<(), AppError> {
    let registry = state.registry.clone();
    let app = build_app(state, static_dir);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(AppError::Serve)?;

    info!(
        clients = registry.count(),
        grace_secs = grace.as_secs(),
        "listener closed, draining connections"
    );

    if !registry.wait_drained(grace).await {
        warn!(
            clients = registry.count(),
            "grace period elapsed, severing remaining connections"
        );
        registry.sever_all();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn app_with_registry(registry: ConnectionRegistry) -> (Router, tempfile::TempDir) {
        let static_dir = tempfile::tempdir().expect("temp dir");
        fs::write(static_dir.path().join("index.html"), "<h1>mcp test client</h1>")
            .expect("write index");
        fs::write(static_dir.path().join("client.js"), "console.log('ok');").expect("write js");

        (build_app(AppState::new(registry), static_dir.path()), static_dir)
    }

    fn app() -> (Router, tempfile::TempDir) {
        app_with_registry(ConnectionRegistry::new())
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, axum::body::Bytes) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_status_and_clients() {
        let registry = ConnectionRegistry::new();
        let _first = registry.register(None);
        let _second = registry.register(None);
        let (app, _dir) = app_with_registry(registry);

        let (status, body) = fetch(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let body_json: serde_json::Value =
            serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["status"], "healthy");
        assert_eq!(body_json["clients"], 2);
        let timestamp = body_json["timestamp"].as_str().expect("timestamp string");
        chrono::DateTime::parse_from_rfc3339(timestamp).expect("rfc3339 timestamp");
    }

    #[tokio::test]
    async fn health_with_no_clients_reports_zero() {
        let (app, _dir) = app();
        let (status, body) = fetch(app, "/health").await;

        assert_eq!(status, StatusCode::OK);
        let body_json: serde_json::Value =
            serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["clients"], 0);
    }

    #[tokio::test]
    async fn health_rejects_post() {
        let (app, _dir) = app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("POST")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn mcp_without_upgrade_is_rejected() {
        let (app, _dir) = app();
        let (status, _) = fetch(app, "/mcp").await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn root_serves_static_index() {
        let (app, _dir) = app();
        let (status, body) = fetch(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<h1>mcp test client</h1>");
    }

    #[tokio::test]
    async fn static_files_are_served_verbatim() {
        let (app, _dir) = app();
        let (status, body) = fetch(app, "/client.js").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log('ok');");
    }

    #[tokio::test]
    async fn missing_static_file_is_not_found() {
        let (app, _dir) = app();
        let (status, _) = fetch(app, "/missing.html").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
