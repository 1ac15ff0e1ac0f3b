//! Outcome of a single tool call against the RAG engine.

use std::fmt;

/// Text returned in place of a query result when the engine cannot be reached
pub const QUERY_FAILED_TEXT: &str = "AgenticRag service call failed";

/// Text returned in place of a health body when the engine cannot be reached
pub const SERVICE_UNAVAILABLE_TEXT: &str = "service unavailable";

/// Fixed text substituted for a result the engine failed to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// A query call failed
    QueryFailed,
    /// A health call failed
    ServiceUnavailable,
}

impl Sentinel {
    /// Display text for this sentinel
    pub fn text(&self) -> &'static str {
        match self {
            Sentinel::QueryFailed => QUERY_FAILED_TEXT,
            Sentinel::ServiceUnavailable => SERVICE_UNAVAILABLE_TEXT,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Either the engine's body or a sentinel with the reason it was used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationResult {
    /// Raw response body
    Success(String),
    /// The call failed; `cause` is for logs, `sentinel` is what callers see
    Fallback { sentinel: Sentinel, cause: String },
}

impl InvocationResult {
    /// Whether the engine produced a body
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success(_))
    }

    /// Text a caller sees
    pub fn text(&self) -> &str {
        match self {
            InvocationResult::Success(body) => body,
            InvocationResult::Fallback { sentinel, .. } => sentinel.text(),
        }
    }

    /// Consume into the text a caller sees
    pub fn into_text(self) -> String {
        match self {
            InvocationResult::Success(body) => body,
            InvocationResult::Fallback { sentinel, .. } => sentinel.text().to_string(),
        }
    }

    /// Failure cause, if the call failed
    pub fn cause(&self) -> Option<&str> {
        match self {
            InvocationResult::Success(_) => None,
            InvocationResult::Fallback { cause, .. } => Some(cause),
        }
    }
}

/// Render one entry of a batch report
pub fn format_batch_entry(position: usize, query: &str, outcome: &str) -> String {
    format!("query {}: {}\nresult: {}\n\n", position, query, outcome)
}

/// Render a health report
pub fn format_status(outcome: &str) -> String {
    format!("AgenticRag service status: {}", outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_text() {
        let result = InvocationResult::Success("{\"data\":\"ok\"}".to_string());
        assert!(result.is_success());
        assert_eq!(result.text(), "{\"data\":\"ok\"}");
        assert_eq!(result.cause(), None);
    }

    #[test]
    fn test_fallback_text_hides_cause() {
        let result = InvocationResult::Fallback {
            sentinel: Sentinel::QueryFailed,
            cause: "HTTP 500 Internal Server Error".to_string(),
        };
        assert!(!result.is_success());
        assert_eq!(result.text(), QUERY_FAILED_TEXT);
        assert_eq!(result.cause(), Some("HTTP 500 Internal Server Error"));
        assert_eq!(result.into_text(), QUERY_FAILED_TEXT);
    }

    #[test]
    fn test_format_batch_entry() {
        assert_eq!(
            format_batch_entry(2, "what is rag", "retrieval"),
            "query 2: what is rag\nresult: retrieval\n\n"
        );
    }

    #[test]
    fn test_format_status() {
        assert_eq!(
            format_status(Sentinel::ServiceUnavailable.text()),
            "AgenticRag service status: service unavailable"
        );
    }
}
