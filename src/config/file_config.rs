//! Writing configuration files.
//!
//! # Configuration File Format
//!
//! ```toml
//! [rag]
//! base_url = "http://localhost:8080"
//! timeout_seconds = 30
//! max_body_bytes = 1048576
//!
//! [streaming]
//! token_delay_ms = 100
//! emit_delay_ms = 50
//!
//! [server]
//! bind = "127.0.0.1:8081"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use super::{Config, ConfigError};

/// Render the default configuration as TOML
pub fn default_config_toml() -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(&Config::default())?)
}

/// Save configuration to a TOML file, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
