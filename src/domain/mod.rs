//! Tool catalog and tool implementations
//!
//! Provides the built-in tools exposed over the MCP protocol

pub mod tools;
