//! Gateway façade: the operations behind the HTTP endpoints.
//!
//! [`Gateway`] owns the profile registry and the default invoker and turns
//! each caller request into registry lookups, invoker calls or a paced
//! answer stream. [`routes`] exposes the same operations over HTTP.

pub mod routes;

pub use routes::{router, serve};

use futures_util::stream::Stream;
use futures_util::StreamExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, StreamingConfig};
use crate::models::{
    ConfigResponse, ConfigurationStatus, HealthResponse, QueryResponse, RemovalResponse,
    ServerConfigRequest, ServerProfile, ServerStatusResponse,
};
use crate::rag::{InvokerError, RagInvoker};
use crate::registry::ConfigRegistry;
use crate::utils::{paced, CancelHandle, StreamChunk, StreamSession};

/// Service name reported by the liveness endpoint
pub const SERVICE_NAME: &str = "rag-gateway";

/// Label attached to query responses
const QUERY_METHOD: &str = "MCP tool call";

/// Message on a rejected configure-server call
pub const CONFIGURE_FAILED_MESSAGE: &str = "MCP server configuration failed";

/// Composition root shared by every request handler
#[derive(Debug, Clone)]
pub struct Gateway {
    registry: Arc<ConfigRegistry>,
    invoker: RagInvoker,
    streaming: StreamingConfig,
}

impl Gateway {
    /// Create a gateway with an empty registry
    pub fn new(invoker: RagInvoker, streaming: StreamingConfig) -> Self {
        Self::with_registry(Arc::new(ConfigRegistry::new()), invoker, streaming)
    }

    /// Create a gateway around an existing registry
    pub fn with_registry(
        registry: Arc<ConfigRegistry>,
        invoker: RagInvoker,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            registry,
            invoker,
            streaming,
        }
    }

    /// Create a gateway from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, InvokerError> {
        Ok(Self::new(
            RagInvoker::from_config(&config.rag)?,
            config.streaming,
        ))
    }

    /// The profile registry
    pub fn registry(&self) -> &Arc<ConfigRegistry> {
        &self.registry
    }

    /// The default invoker
    pub fn invoker(&self) -> &RagInvoker {
        &self.invoker
    }

    /// Register or replace a server profile
    pub fn configure_server(&self, request: ServerConfigRequest) -> ConfigResponse {
        let server_name = request.server_name.clone();
        info!("Received MCP server configuration request: {:?}", server_name);

        match self.registry.register(request) {
            Ok(registration) => {
                ConfigResponse::success(registration.server_name, "MCP server configured")
            }
            Err(e) => {
                warn!("Rejected MCP server configuration {:?}: {}", server_name, e);
                ConfigResponse::failure(server_name, CONFIGURE_FAILED_MESSAGE, e.to_string())
            }
        }
    }

    /// Every configured server name
    pub fn list_servers(&self) -> BTreeMap<String, ConfigurationStatus> {
        self.registry.list_all()
    }

    /// A configured server profile
    pub fn get_server(&self, name: &str) -> Option<ServerProfile> {
        self.registry.get(name)
    }

    /// Remove a server profile; `None` if it was not configured
    pub fn remove_server(&self, name: &str) -> Option<RemovalResponse> {
        self.registry.remove(name).then(|| RemovalResponse {
            server_name: name.to_string(),
            removed: true,
            message: "MCP server configuration removed".to_string(),
        })
    }

    /// Whether a server is configured
    pub fn server_status(&self, name: &str) -> ServerStatusResponse {
        let configured = self.registry.contains(name);
        ServerStatusResponse {
            server_name: name.to_string(),
            configured,
            status: if configured {
                ConfigurationStatus::Configured
            } else {
                ConfigurationStatus::NotConfigured
            },
        }
    }

    /// The gateway's own liveness
    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "UP".to_string(),
            service: SERVICE_NAME.to_string(),
            configured_servers: self.registry.count(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Invoker for an optional named profile; `None` uses the defaults
    pub fn resolve_invoker(&self, server: Option<&str>) -> Result<RagInvoker, InvokerError> {
        match server {
            None => Ok(self.invoker.clone()),
            Some(name) => {
                let profile = self
                    .registry
                    .get(name)
                    .ok_or_else(|| InvokerError::UnknownServer(name.to_string()))?;
                self.invoker.for_profile(Some(&profile))
            }
        }
    }

    /// Run one query.
    ///
    /// Backend failures come back as `success: true` with the sentinel text
    /// in `response`; only an invoker configuration error sets `success:
    /// false`.
    pub async fn invoke_query(&self, query: &str, server: Option<&str>) -> QueryResponse {
        info!("Received query request: {}", query);
        let timestamp = || chrono::Utc::now().timestamp_millis();

        match self.resolve_invoker(server) {
            Ok(invoker) => {
                let response = invoker.query(query).await;
                QueryResponse {
                    query: query.to_string(),
                    success: true,
                    response: Some(response),
                    error: None,
                    timestamp: timestamp(),
                    method: Some(QUERY_METHOD.to_string()),
                }
            }
            Err(e) => {
                error!("Query could not be dispatched: {}", e);
                QueryResponse {
                    query: query.to_string(),
                    success: false,
                    response: None,
                    error: Some(e.to_string()),
                    timestamp: timestamp(),
                    method: None,
                }
            }
        }
    }

    /// Stream an answer to `prompt` as paced chunks.
    ///
    /// Yields the processing notice, then the answer's word tokens and
    /// `[DONE]`; a failure yields an error chunk and `[ERROR]` instead. Every
    /// chunk is held back by the emit delay, every token additionally by the
    /// token delay. Firing `cancel` (or dropping the stream) stops it without
    /// a terminal marker, including while the engine is still answering.
    pub fn stream_chat(
        &self,
        prompt: String,
        server: Option<String>,
        cancel: CancelHandle,
    ) -> impl Stream<Item = StreamChunk> + Send + 'static {
        info!("Received streaming chat request: {}", prompt);

        let gateway = self.clone();
        let token_delay = self.streaming.token_delay();
        let session_cancel = cancel.clone();

        let chunks = async_stream::stream! {
            yield StreamChunk::Notice;

            match gateway.resolve_invoker(server.as_deref()) {
                Ok(invoker) => {
                    let answer = tokio::select! {
                        _ = session_cancel.cancelled() => None,
                        answer = invoker.query(&prompt) => Some(answer),
                    };

                    if let Some(answer) = answer {
                        let tokens = StreamSession::with_cancel(&answer, token_delay, session_cancel)
                            .into_stream();
                        futures_util::pin_mut!(tokens);
                        while let Some(chunk) = tokens.next().await {
                            yield chunk;
                        }
                    } else {
                        debug!("Streaming chat cancelled before the engine answered");
                    }
                }
                Err(e) => {
                    error!("Streaming chat failed: {}", e);
                    yield StreamChunk::Error(e.to_string());
                    yield StreamChunk::ErrorEnd;
                }
            }
        };

        paced(chunks, self.streaming.emit_delay(), cancel)
    }
}
