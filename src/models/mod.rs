//! Core data models for server profiles and gateway responses.

mod profile;
mod response;

pub use profile::{
    ServerConfigRequest, ServerProfile, SseParams, StdioParams, Transport, TransportKind,
    DEFAULT_SSE_TIMEOUT_SECONDS,
};
pub use response::{
    ConfigResponse, ConfigurationStatus, ConnectionStatus, HealthResponse, QueryResponse,
    RemovalResponse, ServerStatusResponse,
};
