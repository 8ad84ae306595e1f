//! The central Model Context Protocol dispatcher
//!
//! Routes an inbound envelope through a static method table to its handler
//! (`initialize`, `tools/list`, `tools/call`) and shapes the response envelope.

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ListToolsResult, ProtocolVersion, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::domain::tools::{handle_tools_call, tool_catalog};
use crate::errors::RpcError;
use crate::mcp::rpc::Envelope;

pub const SUPPORTED_PROTOCOL_VERSION: &str = "2024-11-05";

pub type MethodHandler = fn(Option<Value>) -> Result<Value, RpcError>;

const METHOD_TABLE: &[(&str, MethodHandler)] = &[
    ("initialize", handle_initialize),
    ("tools/list", handle_tools_list),
    ("tools/call", handle_tools_call),
];

pub fn handler_for(method: &str) -> Option<MethodHandler> {
    METHOD_TABLE
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, handler)| *handler)
}

/// Routes one envelope. Notifications are executed but never answered.
pub fn dispatch(envelope: Envelope) -> Option<Envelope> {
    let Envelope {
        id, method, params, ..
    } = envelope;
    let method = method.unwrap_or_default();

    debug!(method = %method, params = ?params, "dispatching request");

    let outcome = match handler_for(&method) {
        Some(handler) => handler(params),
        None => Err(RpcError::MethodNotFound(method.clone())),
    };

    info!(
        method = %method,
        id = ?id,
        outcome = if outcome.is_ok() { "success" } else { "failure" },
        "mcp action audited"
    );

    if id.is_none() {
        return None;
    }

    Some(Envelope::reply(id, outcome))
}

pub fn handle_initialize(_params: Option<Value>) -> Result<Value, RpcError> {
    let initialize_result = InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        protocol_version: ProtocolVersion::V2024_11_05.into(),
        instructions: None,
        meta: None,
    };

    serde_json::to_value(initialize_result)
        .map_err(|err| RpcError::internal(format!("initialize result serialization: {err}")))
}

pub fn handle_tools_list(_params: Option<Value>) -> Result<Value, RpcError> {
    serde_json::to_value(ListToolsResult {
        meta: None,
        next_cursor: None,
        tools: tool_catalog().to_vec(),
    })
    .map_err(|err| RpcError::internal(format!("tools list result serialization: {err}")))
}
