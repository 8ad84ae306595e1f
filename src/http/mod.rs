//! HTTP transport layer for the Model Context Protocol
//!
//! Provides the `/mcp` WebSocket endpoint, its connection loop, and the health report.

pub mod connection;
pub mod handlers;
