//! Interactive tools exposed via Model Context Protocol
//!
//! Provides the immutable tool catalog and the `echo` and `timestamp` implementations.

use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use rust_mcp_sdk::{
    macros,
    schema::{CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::RpcError;

#[macros::mcp_tool(name = "echo", description = "Echo back the input message")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct EchoTool {
    /// The message to echo back
    pub message: String,
}

#[macros::mcp_tool(name = "timestamp", description = "Get the current timestamp")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct TimestampTool {}

static TOOL_CATALOG: OnceLock<Vec<Tool>> = OnceLock::new();

/// Tools in declaration order. Built on first use and shared by every connection.
pub fn tool_catalog() -> &'static [Tool] {
    TOOL_CATALOG.get_or_init(|| vec![EchoTool::tool(), TimestampTool::tool()])
}

/// A `tools/call` request decoded into one of the known tool shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    Echo { message: String },
    Timestamp,
}

impl ToolInvocation {
    pub fn from_params(params: Option<&Value>) -> Result<Self, RpcError> {
        let params = params
            .and_then(Value::as_object)
            .ok_or_else(RpcError::invalid_params)?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(RpcError::missing_tool_name)?;

        let arguments = params.get("arguments").and_then(Value::as_object);

        match name {
            "echo" => Ok(Self::Echo {
                message: string_argument(arguments, "message"),
            }),
            "timestamp" => Ok(Self::Timestamp),
            other => Err(RpcError::ToolNotFound(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Echo { .. } => "echo",
            Self::Timestamp => "timestamp",
        }
    }

    pub fn execute(self) -> Result<CallToolResult, RpcError> {
        let text = match self {
            Self::Echo { message } => format!("Echo: {message}"),
            Self::Timestamp => Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        Ok(CallToolResult {
            content: vec![ContentBlock::from(TextContent::new(text, None, None))],
            is_error: None,
            meta: None,
            structured_content: None,
        })
    }
}

// Missing or non-string arguments read as an empty string.
fn string_argument(arguments: Option<&Map<String, Value>>, key: &str) -> String {
    arguments
        .and_then(|arguments| arguments.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn handle_tools_call(params: Option<Value>) -> Result<Value, RpcError> {
    let invocation = ToolInvocation::from_params(params.as_ref())?;
    let tool = invocation.name();
    let result = invocation.execute()?;

    serde_json::to_value(result)
        .map_err(|err| RpcError::internal(format!("{tool} result serialization: {err}")))
}
