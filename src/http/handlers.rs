//! Axum HTTP handlers for the web server
//!
//! Provides the `/mcp` WebSocket upgrade and the `/health` liveness report.

use std::net::SocketAddr;

use axum::{
    extract::{connect_info::ConnectInfo, ws::WebSocketUpgrade, State},
    response::Response,
    Extension, Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::warn;

use crate::http::connection::run_connection;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub clients: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        clients: state.registry.count(),
    })
}

pub async fn mcp_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Response {
    let peer = connect_info.map(|Extension(ConnectInfo(addr))| addr);

    ws.on_failed_upgrade(|err| warn!(error = %err, "failed to upgrade websocket connection"))
        .on_upgrade(move |socket| run_connection(socket, state.registry, peer))
}
