//! Configuration management.
//!
//! Settings come from an optional TOML file overlaid with `RAG_GATEWAY__*`
//! environment variables, where `__` separates section and key
//! (`RAG_GATEWAY__RAG__BASE_URL`). Values are read once at startup.

mod file_config;

pub use file_config::{default_config_toml, save_config};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RAG_GATEWAY";

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "rag-gateway.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// RAG engine settings
    #[serde(default)]
    pub rag: RagConfig,

    /// Streaming pacing
    #[serde(default)]
    pub streaming: StreamingConfig,

    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the RAG engine lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagConfig {
    /// Base URL of the engine
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Largest response body accepted from the engine, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl RagConfig {
    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Pacing of streamed answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Delay between word tokens, in milliseconds
    #[serde(default = "default_token_delay_ms")]
    pub token_delay_ms: u64,

    /// Delay applied to every emitted chunk, in milliseconds
    #[serde(default = "default_emit_delay_ms")]
    pub emit_delay_ms: u64,
}

impl StreamingConfig {
    /// Delay between word tokens
    pub fn token_delay(&self) -> Duration {
        Duration::from_millis(self.token_delay_ms)
    }

    /// Delay applied to every emitted chunk
    pub fn emit_delay(&self) -> Duration {
        Duration::from_millis(self.emit_delay_ms)
    }

    /// No pacing at all
    pub fn immediate() -> Self {
        Self {
            token_delay_ms: 0,
            emit_delay_ms: 0,
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            token_delay_ms: default_token_delay_ms(),
            emit_delay_ms: default_emit_delay_ms(),
        }
    }
}

fn default_token_delay_ms() -> u64 {
    100
}

fn default_emit_delay_ms() -> u64 {
    50
}

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the gateway binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8081".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `json` for structured output, anything else for plain text
    #[serde(default)]
    pub format: Option<String>,
}

impl LoggingConfig {
    /// Whether JSON output was requested
    pub fn is_json(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|format| format.eq_ignore_ascii_case("json"))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a file, with environment overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Configuration from defaults and environment variables only
pub fn get_config() -> Result<Config, ConfigError> {
    let settings = config::Config::builder()
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Find a configuration file in the default locations.
///
/// Checks `./rag-gateway.toml`, then `<config dir>/rag-gateway/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("rag-gateway").join("config.toml"))
        .filter(|path| path.is_file())
}
