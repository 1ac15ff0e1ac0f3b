//! Response bodies returned by the gateway.

use serde::{Deserialize, Serialize};

/// Label attached to a registration attempt.
///
/// `Connected` only means the profile was accepted; no handshake happens at
/// registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    Connected,
    Failed,
}

/// Whether a profile name is present in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigurationStatus {
    Configured,
    NotConfigured,
}

impl ConfigurationStatus {
    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigurationStatus::Configured => "CONFIGURED",
            ConfigurationStatus::NotConfigured => "NOT_CONFIGURED",
        }
    }
}

/// Outcome of a configure-server call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub success: bool,
    pub message: String,
    pub server_name: Option<String>,
    pub status: ConnectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl ConfigResponse {
    /// Successful registration
    pub fn success(server_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            server_name: Some(server_name.into()),
            status: ConnectionStatus::Connected,
            error_detail: None,
        }
    }

    /// Rejected registration
    pub fn failure(
        server_name: Option<String>,
        message: impl Into<String>,
        error_detail: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            server_name,
            status: ConnectionStatus::Failed,
            error_detail: Some(error_detail.into()),
        }
    }
}

/// Outcome of a remove-server call that found its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalResponse {
    pub server_name: String,
    pub removed: bool,
    pub message: String,
}

/// Body of server-status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusResponse {
    pub server_name: String,
    pub configured: bool,
    pub status: ConfigurationStatus,
}

/// Body of invoke-query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Body of the gateway's own liveness endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub configured_servers: usize,
    pub timestamp: i64,
}
