//! Handlers for the RAG tools.
//!
//! Each handler resolves the optional `server` argument to an invoker and
//! returns the invoker's text as a JSON string. Backend failures arrive as
//! sentinel text, not as tool errors.

use serde_json::Value;

use super::tools::ToolHandler;
use crate::gateway::Gateway;
use crate::rag::RagInvoker;

fn resolve(gateway: &Gateway, args: &Value) -> Result<RagInvoker, String> {
    let server = args.get("server").and_then(|v| v.as_str());
    gateway.resolve_invoker(server).map_err(|e| e.to_string())
}

/// Handler for `query_with_agentic_rag`
#[derive(Debug)]
pub struct QueryHandler {
    pub gateway: Gateway,
}

#[async_trait::async_trait]
impl ToolHandler for QueryHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or("Missing 'query' parameter")?;

        let invoker = resolve(&self.gateway, &args)?;
        Ok(Value::String(invoker.query(query).await))
    }
}

/// Handler for `batch_query_with_agentic_rag`
#[derive(Debug)]
pub struct BatchQueryHandler {
    pub gateway: Gateway,
}

#[async_trait::async_trait]
impl ToolHandler for BatchQueryHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let queries = args
            .get("queries")
            .and_then(|v| v.as_array())
            .ok_or("Missing 'queries' parameter")?
            .iter()
            .map(|v| v.as_str().ok_or("'queries' must contain only strings"))
            .collect::<Result<Vec<_>, _>>()?;

        let invoker = resolve(&self.gateway, &args)?;
        Ok(Value::String(invoker.batch_query(&queries).await))
    }
}

/// Handler for `get_agentic_rag_status`
#[derive(Debug)]
pub struct StatusHandler {
    pub gateway: Gateway,
}

#[async_trait::async_trait]
impl ToolHandler for StatusHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let invoker = resolve(&self.gateway, &args)?;
        Ok(Value::String(invoker.health_check().await))
    }
}
