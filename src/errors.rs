use std::{io, net::SocketAddr};

use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::rpc::ErrorDetail;

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// Failures raised while handling a single request. Each one is turned into
/// an error envelope at the point it is detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("{0}")]
    InvalidParams(&'static str),
    #[error("Tool execution failed: {0}")]
    Internal(String),
}

impl RpcError {
    pub fn invalid_params() -> Self {
        Self::InvalidParams("Invalid params")
    }

    pub fn missing_tool_name() -> Self {
        Self::InvalidParams("Tool name is required")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound(_) | Self::ToolNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
        }
    }

    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code(),
            message: self.to_string(),
            data: None,
        }
    }
}

impl From<RpcError> for ErrorDetail {
    fn from(err: RpcError) -> Self {
        err.to_detail()
    }
}

/// Process-level failures that abort startup or serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
