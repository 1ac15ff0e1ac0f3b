//! # RAG Gateway
//!
//! Fronts a remote Agentic RAG engine. Callers register named server
//! profiles, query the engine (one question, a batch, or a health check),
//! and receive answers either whole or as a paced token stream.
//!
//! ## Architecture
//!
//! - [`registry`]: concurrent map of named server profiles
//! - [`rag`]: HTTP invoker for the RAG engine, with sentinel fallbacks
//! - [`gateway`]: façade operations and the axum HTTP surface
//! - [`mcp`]: the invoker's operations as MCP tools
//! - [`models`]: profiles and response bodies
//! - [`utils`]: HTTP client, streaming and validation
//! - [`config`]: configuration management

pub mod config;
pub mod gateway;
pub mod mcp;
pub mod models;
pub mod rag;
pub mod registry;
pub mod utils;

// Re-export commonly used types
pub use gateway::Gateway;
pub use models::{ServerConfigRequest, ServerProfile};
pub use rag::{InvocationResult, RagInvoker};
pub use registry::ConfigRegistry;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
