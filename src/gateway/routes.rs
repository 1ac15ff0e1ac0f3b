//! HTTP surface of the gateway under `/api/mcp`.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::{Gateway, CONFIGURE_FAILED_MESSAGE};
use crate::models::{
    ConfigResponse, ConfigurationStatus, HealthResponse, QueryResponse, RemovalResponse,
    ServerConfigRequest, ServerProfile, ServerStatusResponse,
};
use crate::utils::{into_frames, CancelHandle};

/// Errors returned by HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("server '{0}' is not configured")]
    NotFound(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Bind { .. } | GatewayError::Serve(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct QueryParams {
    query: String,
    server: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatParams {
    prompt: String,
    server: Option<String>,
}

/// Build the router for all gateway endpoints
pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/api/mcp/health", get(health))
        .route("/api/mcp/servers", get(list_servers).post(configure_server))
        .route(
            "/api/mcp/servers/{name}",
            get(get_server).delete(remove_server),
        )
        .route("/api/mcp/servers/{name}/status", get(server_status))
        .route("/api/mcp/test/query", get(test_query))
        .route("/api/mcp/chat/stream", get(stream_chat))
        .with_state(gateway)
}

/// Serve the gateway on `addr` until Ctrl-C
pub async fn serve(gateway: Gateway, addr: &str) -> Result<(), GatewayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let local: SocketAddr = listener.local_addr()?;
    info!("Gateway listening on http://{}", local);

    axum::serve(listener, router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn health(State(gateway): State<Gateway>) -> Json<HealthResponse> {
    Json(gateway.health())
}

/// Bodies that do not decode into a request are rejected like any other
/// invalid profile, with a structured failure body.
async fn configure_server(
    State(gateway): State<Gateway>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<ConfigResponse>) {
    let response = match payload {
        Ok(Json(body)) => {
            let server_name = body
                .get("serverName")
                .and_then(Value::as_str)
                .map(str::to_string);
            match serde_json::from_value::<ServerConfigRequest>(body) {
                Ok(request) => gateway.configure_server(request),
                Err(e) => undecodable(server_name, e.to_string()),
            }
        }
        Err(rejection) => undecodable(None, rejection.body_text()),
    };
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(response))
}

fn undecodable(server_name: Option<String>, detail: String) -> ConfigResponse {
    warn!("Rejected undecodable MCP server configuration: {}", detail);
    ConfigResponse::failure(server_name, CONFIGURE_FAILED_MESSAGE, detail)
}

async fn list_servers(
    State(gateway): State<Gateway>,
) -> Json<BTreeMap<String, ConfigurationStatus>> {
    Json(gateway.list_servers())
}

async fn get_server(
    State(gateway): State<Gateway>,
    Path(name): Path<String>,
) -> Result<Json<ServerProfile>, GatewayError> {
    gateway
        .get_server(&name)
        .map(Json)
        .ok_or(GatewayError::NotFound(name))
}

async fn remove_server(
    State(gateway): State<Gateway>,
    Path(name): Path<String>,
) -> Result<Json<RemovalResponse>, GatewayError> {
    gateway
        .remove_server(&name)
        .map(Json)
        .ok_or(GatewayError::NotFound(name))
}

async fn server_status(
    State(gateway): State<Gateway>,
    Path(name): Path<String>,
) -> Json<ServerStatusResponse> {
    Json(gateway.server_status(&name))
}

async fn test_query(
    State(gateway): State<Gateway>,
    Query(params): Query<QueryParams>,
) -> (StatusCode, Json<QueryResponse>) {
    let response = gateway
        .invoke_query(&params.query, params.server.as_deref())
        .await;
    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(response))
}

async fn stream_chat(
    State(gateway): State<Gateway>,
    Query(params): Query<ChatParams>,
) -> Response {
    let cancel = CancelHandle::new();
    let chunks = gateway.stream_chat(params.prompt, params.server, cancel.clone());
    let frames = into_frames(chunks, &cancel);

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(frames),
    )
        .into_response()
}
