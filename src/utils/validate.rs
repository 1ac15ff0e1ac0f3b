//! Input validation for server profile registration.
//!
//! Every check here runs before a profile is stored, so the registry only
//! ever holds profiles whose transport block matches their transport kind.

use thiserror::Error;

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server name must not be empty")]
    MissingServerName,

    #[error("transport type must not be empty")]
    MissingTransportType,

    #[error("{0} transport requires a {1} block")]
    MissingTransportConfig(&'static str, &'static str),

    #[error("command must not be empty")]
    MissingCommand,

    #[error("invalid command: {0}")]
    InvalidCommand(&'static str),

    #[error("invalid environment variable name: {0:?}")]
    InvalidEnvName(String),

    #[error("server URL must not be empty")]
    MissingUrl,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("timeout must be at least one second")]
    InvalidTimeout,
}

/// Validate a server name.
///
/// Surrounding whitespace is kept as-is; a name made only of whitespace is
/// rejected.
pub fn validate_server_name(name: Option<&str>) -> Result<String, ValidationError> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(ValidationError::MissingServerName),
    }
}

/// Validate the command used to launch a stdio server
pub fn validate_command(command: &str) -> Result<(), ValidationError> {
    if command.trim().is_empty() {
        return Err(ValidationError::MissingCommand);
    }

    if command.contains('\0') {
        return Err(ValidationError::InvalidCommand("contains a NUL byte"));
    }

    Ok(())
}

/// Validate an environment variable name for a stdio server
pub fn validate_env_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.contains('=') || name.contains('\0') {
        return Err(ValidationError::InvalidEnvName(name.to_string()));
    }
    Ok(())
}

/// Validate the URL of an SSE server or of the RAG engine.
///
/// Only `http` and `https` URLs are accepted. Loopback and private hosts are
/// allowed.
pub fn validate_url(url: &str) -> Result<url::Url, ValidationError> {
    let url = url.trim();

    if url.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    if url.contains('\0') || url.contains('\n') || url.contains('\r') {
        return Err(ValidationError::InvalidUrl(
            "contains control characters".to_string(),
        ));
    }

    let parsed = url::Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ValidationError::InvalidUrl(format!(
                "invalid scheme: {}",
                other
            )))
        }
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl("missing host".to_string()));
    }

    Ok(parsed)
}

/// Validate a connection timeout in seconds
pub fn validate_timeout(seconds: u64) -> Result<(), ValidationError> {
    if seconds == 0 {
        return Err(ValidationError::InvalidTimeout);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_server_name() {
        assert_eq!(validate_server_name(Some("svc1")).unwrap(), "svc1");
        assert_eq!(
            validate_server_name(Some("")),
            Err(ValidationError::MissingServerName)
        );
        assert_eq!(
            validate_server_name(Some("   \t")),
            Err(ValidationError::MissingServerName)
        );
        assert_eq!(
            validate_server_name(None),
            Err(ValidationError::MissingServerName)
        );
    }

    #[test]
    fn test_validate_command() {
        assert!(validate_command("npx").is_ok());
        assert!(validate_command("").is_err());
        assert!(validate_command("  ").is_err());
        assert_eq!(
            validate_command("rag\0mcp"),
            Err(ValidationError::InvalidCommand("contains a NUL byte"))
        );
        assert_eq!(
            ValidationError::InvalidCommand("contains a NUL byte").to_string(),
            "invalid command: contains a NUL byte"
        );
    }

    #[test]
    fn test_validate_env_name() {
        assert!(validate_env_name("API_KEY").is_ok());
        assert!(validate_env_name("").is_err());
        assert!(validate_env_name("A=B").is_err());
    }

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("http://x").is_ok());
        assert!(validate_url("https://rag.example.com/api").is_ok());
        // Local engines are the common case
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("http://127.0.0.1:9000").is_ok());
    }

    #[test]
    fn test_validate_url_invalid() {
        assert_eq!(validate_url(""), Err(ValidationError::MissingUrl));
        assert!(matches!(
            validate_url("ftp://example.com"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("not a url"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("http://example.com/\npath"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_validate_timeout() {
        assert!(validate_timeout(1).is_ok());
        assert!(validate_timeout(30).is_ok());
        assert_eq!(validate_timeout(0), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::MissingTransportConfig("STDIO", "stdioConfig").to_string(),
            "STDIO transport requires a stdioConfig block"
        );
    }
}
