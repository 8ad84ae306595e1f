//! Model Context Protocol (MCP) envelope types and method dispatch
//!
//! Provides the JSON-RPC wire shapes and the routing of methods to their handlers.

pub mod rpc;
pub mod server;
