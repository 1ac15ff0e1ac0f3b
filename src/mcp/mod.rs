//! MCP (Model Context Protocol) tool surface.

mod rag_tools;
pub mod server;
mod tools;

pub use server::McpServer;
pub use tools::{Tool, ToolHandler, ToolRegistry};
