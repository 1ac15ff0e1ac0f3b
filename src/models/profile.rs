//! Server connection profiles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

use crate::utils::{
    validate_command, validate_env_name, validate_server_name, validate_timeout, validate_url,
    ValidationError,
};

/// Default SSE connection timeout in seconds
pub const DEFAULT_SSE_TIMEOUT_SECONDS: u64 = 30;

/// How a profile reaches its server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransportKind {
    /// Child process speaking over stdin/stdout
    Stdio,
    /// Streaming HTTP (server-sent events)
    Sse,
}

impl TransportKind {
    /// Wire name of the transport
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "STDIO",
            TransportKind::Sse => "SSE",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for a server launched as a child process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StdioParams {
    /// Executable to run
    #[serde(default)]
    pub command: String,

    /// Arguments, in order
    #[serde(default)]
    pub args: Vec<String>,

    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl StdioParams {
    /// Create stdio parameters for a command
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }
}

/// Parameters for a server reached over SSE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SseParams {
    /// Server URL
    #[serde(default)]
    pub url: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_SSE_TIMEOUT_SECONDS
}

impl Default for SseParams {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_seconds: DEFAULT_SSE_TIMEOUT_SECONDS,
            headers: HashMap::new(),
        }
    }
}

impl SseParams {
    /// Create SSE parameters for a URL with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Set the timeout in seconds
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Unvalidated profile as received from a caller.
///
/// This is also the JSON shape a stored [`ServerProfile`] is rendered as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigRequest {
    /// Profile name
    #[serde(default)]
    pub server_name: Option<String>,

    /// Transport kind
    #[serde(default)]
    pub transport_type: Option<TransportKind>,

    /// Parameters for `STDIO`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdio_config: Option<StdioParams>,

    /// Parameters for `SSE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sse_config: Option<SseParams>,
}

impl ServerConfigRequest {
    /// Start a request for the named server
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: Some(server_name.into()),
            ..Self::default()
        }
    }

    /// Use the stdio transport
    pub fn stdio(mut self, params: StdioParams) -> Self {
        self.transport_type = Some(TransportKind::Stdio);
        self.stdio_config = Some(params);
        self
    }

    /// Use the SSE transport
    pub fn sse(mut self, params: SseParams) -> Self {
        self.transport_type = Some(TransportKind::Sse);
        self.sse_config = Some(params);
        self
    }
}

/// Transport together with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Stdio(StdioParams),
    Sse(SseParams),
}

impl Transport {
    /// Kind of this transport
    pub fn kind(&self) -> TransportKind {
        match self {
            Transport::Stdio(_) => TransportKind::Stdio,
            Transport::Sse(_) => TransportKind::Sse,
        }
    }
}

/// A validated, named description of how to reach one server.
///
/// Only obtainable through validation, so the parameter block always matches
/// the transport kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ServerConfigRequest", try_from = "ServerConfigRequest")]
pub struct ServerProfile {
    name: String,
    transport: Transport,
}

impl ServerProfile {
    /// Profile name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Transport and parameters
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Transport kind
    pub fn kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// SSE parameters, if this is an SSE profile
    pub fn sse_params(&self) -> Option<&SseParams> {
        match &self.transport {
            Transport::Sse(params) => Some(params),
            Transport::Stdio(_) => None,
        }
    }

    /// Stdio parameters, if this is a stdio profile
    pub fn stdio_params(&self) -> Option<&StdioParams> {
        match &self.transport {
            Transport::Stdio(params) => Some(params),
            Transport::Sse(_) => None,
        }
    }
}

impl TryFrom<ServerConfigRequest> for ServerProfile {
    type Error = ValidationError;

    fn try_from(request: ServerConfigRequest) -> Result<Self, Self::Error> {
        let name = validate_server_name(request.server_name.as_deref())?;
        let kind = request
            .transport_type
            .ok_or(ValidationError::MissingTransportType)?;

        let transport = match kind {
            TransportKind::Stdio => {
                if request.sse_config.is_some() {
                    warn!("Ignoring sseConfig on STDIO server '{}'", name);
                }
                let params = request
                    .stdio_config
                    .ok_or(ValidationError::MissingTransportConfig("STDIO", "stdioConfig"))?;
                validate_command(&params.command)?;
                for env_name in params.env.keys() {
                    validate_env_name(env_name)?;
                }
                Transport::Stdio(params)
            }
            TransportKind::Sse => {
                if request.stdio_config.is_some() {
                    warn!("Ignoring stdioConfig on SSE server '{}'", name);
                }
                let params = request
                    .sse_config
                    .ok_or(ValidationError::MissingTransportConfig("SSE", "sseConfig"))?;
                validate_url(&params.url)?;
                validate_timeout(params.timeout_seconds)?;
                Transport::Sse(params)
            }
        };

        Ok(Self { name, transport })
    }
}

impl From<ServerProfile> for ServerConfigRequest {
    fn from(profile: ServerProfile) -> Self {
        let request = ServerConfigRequest::new(profile.name);
        match profile.transport {
            Transport::Stdio(params) => request.stdio(params),
            Transport::Sse(params) => request.sse(params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sse_profile_from_request() {
        let request = ServerConfigRequest::new("svc1")
            .sse(SseParams::new("http://x").timeout_seconds(5));
        let profile = ServerProfile::try_from(request).unwrap();

        assert_eq!(profile.name(), "svc1");
        assert_eq!(profile.kind(), TransportKind::Sse);
        assert_eq!(profile.sse_params().unwrap().timeout_seconds, 5);
        assert!(profile.stdio_params().is_none());
    }

    #[test]
    fn test_stdio_profile_from_request() {
        let request = ServerConfigRequest::new("local").stdio(
            StdioParams::new("npx")
                .arg("-y")
                .arg("@modelcontextprotocol/server-everything")
                .env("DEBUG", "1"),
        );
        let profile = ServerProfile::try_from(request).unwrap();

        let params = profile.stdio_params().unwrap();
        assert_eq!(params.command, "npx");
        assert_eq!(params.args, vec!["-y", "@modelcontextprotocol/server-everything"]);
        assert_eq!(params.env.get("DEBUG").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_missing_transport_type() {
        let request = ServerConfigRequest::new("svc1");
        assert_eq!(
            ServerProfile::try_from(request),
            Err(ValidationError::MissingTransportType)
        );
    }

    #[test]
    fn test_transport_block_must_match_kind() {
        let mut request = ServerConfigRequest::new("svc1").sse(SseParams::new("http://x"));
        request.transport_type = Some(TransportKind::Stdio);

        assert_eq!(
            ServerProfile::try_from(request),
            Err(ValidationError::MissingTransportConfig("STDIO", "stdioConfig"))
        );
    }

    #[test]
    fn test_mismatched_block_is_dropped() {
        let mut request = ServerConfigRequest::new("svc1").sse(SseParams::new("http://x"));
        request.stdio_config = Some(StdioParams::new("ignored"));

        let profile = ServerProfile::try_from(request).unwrap();
        let rendered = ServerConfigRequest::from(profile);
        assert!(rendered.stdio_config.is_none());
        assert!(rendered.sse_config.is_some());
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "serverName": "svc1",
            "transportType": "SSE",
            "sseConfig": { "url": "http://x" }
        }"#;
        let request: ServerConfigRequest = serde_json::from_str(json).unwrap();
        let profile = ServerProfile::try_from(request).unwrap();

        assert_eq!(
            profile.sse_params().unwrap().timeout_seconds,
            DEFAULT_SSE_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let json = r#"{ "serverName": "svc1", "transportType": "WEBSOCKET" }"#;
        assert!(serde_json::from_str::<ServerConfigRequest>(json).is_err());
    }

    #[test]
    fn test_profile_serializes_as_request() {
        let profile = ServerProfile::try_from(
            ServerConfigRequest::new("svc1").sse(SseParams::new("http://x").timeout_seconds(5)),
        )
        .unwrap();

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["serverName"], "svc1");
        assert_eq!(value["transportType"], "SSE");
        assert_eq!(value["sseConfig"]["timeoutSeconds"], 5);
        assert!(value.get("stdioConfig").is_none());

        let back: ServerProfile = serde_json::from_value(value).unwrap();
        assert_eq!(back, profile);
    }
}
