//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::gateway::Gateway;

pub use super::rag_tools::{BatchQueryHandler, QueryHandler, StatusHandler};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "query_with_agentic_rag")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a registry with the RAG tools bound to `gateway`
    pub fn from_gateway(gateway: &Gateway) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_rag_tools(gateway);
        registry
    }

    fn register_rag_tools(&mut self, gateway: &Gateway) {
        let server_property = serde_json::json!({
            "type": "string",
            "description": "Name of a configured SSE server profile. If not specified, the default RAG engine is used."
        });

        self.register(Tool {
            name: "query_with_agentic_rag".to_string(),
            description: "Query the Agentic RAG engine with a natural-language question".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question to answer"
                    },
                    "server": server_property
                },
                "required": ["query"]
            }),
            handler: Arc::new(QueryHandler {
                gateway: gateway.clone(),
            }),
        });

        self.register(Tool {
            name: "batch_query_with_agentic_rag".to_string(),
            description: "Run several queries against the Agentic RAG engine, one after another".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "queries": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Questions to answer, in order"
                    },
                    "server": server_property
                },
                "required": ["queries"]
            }),
            handler: Arc::new(BatchQueryHandler {
                gateway: gateway.clone(),
            }),
        });

        self.register(Tool {
            name: "get_agentic_rag_status".to_string(),
            description: "Report whether the Agentic RAG engine is reachable".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "server": server_property
                }
            }),
            handler: Arc::new(StatusHandler {
                gateway: gateway.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}
