//! MCP Server for personal notes
//!
//! Exposes search and note operations to AI assistants over stdio.

mod server;

pub use server::run_mcp_server;
