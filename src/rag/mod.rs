//! Tool-invocation bridge to the Agentic RAG engine.
//!
//! The engine is an opaque HTTP service exposing `GET /query?q=<text>` and
//! `GET /health`. Tool calls made from inside a model's reasoning loop must
//! always come back with text, so backend failures never leave this module as
//! errors: they become an [`InvocationResult::Fallback`] whose [`Sentinel`]
//! text stands in for the body. Only configuration defects (a malformed base
//! URL, a profile that cannot be reached over HTTP) are returned as
//! [`InvokerError`].

mod result;

pub use result::{
    format_batch_entry, format_status, InvocationResult, Sentinel, QUERY_FAILED_TEXT,
    SERVICE_UNAVAILABLE_TEXT,
};

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

use crate::config::RagConfig;
use crate::models::{ServerProfile, Transport, TransportKind};
use crate::utils::{validate_url, HttpClient};

/// Configuration errors raised by the invoker
#[derive(Debug, thiserror::Error)]
pub enum InvokerError {
    #[error("invalid RAG base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("server '{0}' is not configured")]
    UnknownServer(String),

    #[error("server '{0}' uses the {1} transport and cannot be queried over HTTP")]
    UnsupportedTransport(String, TransportKind),

    #[error("invalid header '{header}' on server '{server}'")]
    InvalidHeader { server: String, header: String },

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Why a backend call produced no body
#[derive(Debug, thiserror::Error)]
enum BackendError {
    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("response body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

/// Default cap on a response body read from the engine
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Issues query, batch and health calls against one RAG endpoint
#[derive(Debug, Clone)]
pub struct RagInvoker {
    client: HttpClient,
    base_url: Url,
    timeout: Duration,
    headers: HeaderMap,
    max_body_bytes: usize,
    target: String,
}

impl RagInvoker {
    /// Create an invoker for `base_url` with its own HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, InvokerError> {
        let client = HttpClient::new().map_err(|e| InvokerError::Client(e.to_string()))?;
        Self::with_client(client, base_url, timeout)
    }

    /// Create an invoker from the `[rag]` configuration section
    pub fn from_config(config: &RagConfig) -> Result<Self, InvokerError> {
        let invoker = Self::new(&config.base_url, config.timeout())?;
        Ok(invoker.with_max_body_bytes(config.max_body_bytes))
    }

    /// Create an invoker sharing an existing HTTP client
    pub fn with_client(
        client: HttpClient,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, InvokerError> {
        Ok(Self {
            client,
            base_url: parse_base_url(base_url)?,
            timeout,
            headers: HeaderMap::new(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            target: "default".to_string(),
        })
    }

    /// Base URL calls are issued against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the largest response body accepted before the call counts as failed
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Largest response body accepted
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Resolve the invoker to use for an optional server profile.
    ///
    /// Without a profile this invoker is returned unchanged. An SSE profile
    /// supplies the base URL, timeout and headers; a stdio profile has no HTTP
    /// endpoint and is rejected.
    pub fn for_profile(&self, profile: Option<&ServerProfile>) -> Result<Self, InvokerError> {
        let Some(profile) = profile else {
            return Ok(self.clone());
        };

        match profile.transport() {
            Transport::Sse(params) => {
                let mut headers = HeaderMap::new();
                for (name, value) in &params.headers {
                    let invalid = || InvokerError::InvalidHeader {
                        server: profile.name().to_string(),
                        header: name.clone(),
                    };
                    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
                    let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
                    headers.insert(name, value);
                }

                Ok(Self {
                    client: self.client.clone(),
                    base_url: parse_base_url(&params.url)?,
                    timeout: Duration::from_secs(params.timeout_seconds),
                    headers,
                    max_body_bytes: self.max_body_bytes,
                    target: profile.name().to_string(),
                })
            }
            Transport::Stdio(_) => Err(InvokerError::UnsupportedTransport(
                profile.name().to_string(),
                TransportKind::Stdio,
            )),
        }
    }

    /// Query the engine, keeping the failure cause visible.
    pub async fn invoke_query(&self, text: &str) -> InvocationResult {
        let mut url = self.endpoint("query");
        url.query_pairs_mut().append_pair("q", text);

        let request = self
            .client
            .client()
            .get(url)
            .header(CONTENT_TYPE, "application/json");

        match self.send(request).await {
            Ok(body) => {
                debug!("AgenticRag response from {}: {}", self.target, body);
                InvocationResult::Success(body)
            }
            Err(e) => {
                error!("AgenticRag query against {} failed: {}", self.target, e);
                InvocationResult::Fallback {
                    sentinel: Sentinel::QueryFailed,
                    cause: e.to_string(),
                }
            }
        }
    }

    /// Query the engine and return the body, or the query sentinel on failure
    pub async fn query(&self, text: &str) -> String {
        info!("Tool call: query_with_agentic_rag, query: {}", text);
        self.invoke_query(text).await.into_text()
    }

    /// Run one query per input, in order, and render a combined report.
    ///
    /// Each item is isolated: a failed query shows its sentinel and the
    /// remaining items still run.
    pub async fn batch_query<S: AsRef<str>>(&self, queries: &[S]) -> String {
        info!(
            "Tool call: batch_query_with_agentic_rag, query count: {}",
            queries.len()
        );

        let mut report = String::new();
        for (index, query) in queries.iter().enumerate() {
            let query = query.as_ref();
            let outcome = self.invoke_query(query).await;
            report.push_str(&format_batch_entry(index + 1, query, outcome.text()));
        }
        report
    }

    /// Call the health endpoint, keeping the failure cause visible.
    pub async fn invoke_health(&self) -> InvocationResult {
        let request = self.client.client().get(self.endpoint("health"));

        match self.send(request).await {
            Ok(body) => InvocationResult::Success(body),
            Err(e) => {
                error!("AgenticRag health check against {} failed: {}", self.target, e);
                InvocationResult::Fallback {
                    sentinel: Sentinel::ServiceUnavailable,
                    cause: e.to_string(),
                }
            }
        }
    }

    /// Render the engine's health as a status report
    pub async fn health_check(&self) -> String {
        info!("Tool call: get_agentic_rag_status");
        format_status(self.invoke_health().await.text())
    }

    /// `{base}/{segment}`, keeping any path already on the base URL
    fn endpoint(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), segment);
        url.set_path(&path);
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let request = request.headers(self.headers.clone()).timeout(self.timeout);

        let limit = self.max_body_bytes;
        let call = async {
            let mut response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::Status(status));
            }
            if response.content_length().is_some_and(|len| len > limit as u64) {
                return Err(BackendError::BodyTooLarge(limit));
            }

            // Content-Length may be absent or wrong, so count while reading
            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await? {
                if body.len() + chunk.len() > limit {
                    return Err(BackendError::BodyTooLarge(limit));
                }
                body.extend_from_slice(&chunk);
            }
            Ok::<_, BackendError>(String::from_utf8_lossy(&body).into_owned())
        };

        // Covers the body read as well as the request itself
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.timeout)),
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, InvokerError> {
    let url = validate_url(base_url).map_err(|e| InvokerError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(InvokerError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: "cannot be used as a base".to_string(),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ServerConfigRequest, SseParams, StdioParams};
    use mockito::Matcher;
    use std::io::Write;
    use std::time::Instant;

    fn invoker(base_url: &str) -> RagInvoker {
        RagInvoker::new(base_url, Duration::from_secs(5)).unwrap()
    }

    /// Accepts connections and never answers
    async fn silent_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_query_success_returns_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded("q".into(), "测试查询".into()))
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","data":"retrieved"}"#)
            .create_async()
            .await;

        let result = invoker(&server.url()).query("测试查询").await;

        assert_eq!(result, r#"{"status":"success","data":"retrieved"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_server_error_returns_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("Internal Server Error")
            .create_async()
            .await;

        let outcome = invoker(&server.url()).invoke_query("anything").await;

        assert_eq!(outcome.text(), QUERY_FAILED_TEXT);
        assert!(outcome.cause().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_query_connection_refused_returns_sentinel() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = invoker(&format!("http://{}", addr)).query("anything").await;
        assert_eq!(result, QUERY_FAILED_TEXT);
    }

    #[tokio::test]
    async fn test_query_times_out_with_sentinel() {
        let base_url = silent_backend().await;
        let invoker = RagInvoker::new(&base_url, Duration::from_millis(200)).unwrap();

        let started = Instant::now();
        let result = invoker.query("slow").await;

        assert_eq!(result, QUERY_FAILED_TEXT);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_oversized_body_returns_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(vec![b'x'; 4 * 1024 * 1024])
            .create_async()
            .await;

        let invoker = invoker(&server.url());
        assert_eq!(invoker.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);

        let outcome = invoker.invoke_query("q").await;
        assert_eq!(outcome.text(), QUERY_FAILED_TEXT);
        assert!(outcome.cause().unwrap().contains("exceeds"));
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_returns_sentinel() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(|w| {
                for _ in 0..8 {
                    w.write_all(&[b'y'; 16])?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let outcome = invoker(&server.url())
            .with_max_body_bytes(64)
            .invoke_query("q")
            .await;
        assert_eq!(outcome.text(), QUERY_FAILED_TEXT);
        assert!(outcome.cause().unwrap().contains("64 bytes"));
    }

    #[tokio::test]
    async fn test_body_at_limit_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("0123456789")
            .create_async()
            .await;

        let result = invoker(&server.url())
            .with_max_body_bytes(10)
            .query("q")
            .await;
        assert_eq!(result, "0123456789");
    }

    #[test]
    fn test_from_config_applies_body_limit() {
        let config = RagConfig {
            max_body_bytes: 2048,
            ..RagConfig::default()
        };
        let invoker = RagInvoker::from_config(&config).unwrap();
        assert_eq!(invoker.max_body_bytes(), 2048);
        assert_eq!(invoker.timeout(), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_batch_query_isolates_failures() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded("q".into(), "a".into()))
            .with_status(503)
            .create_async()
            .await;
        server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded("q".into(), "b".into()))
            .with_status(200)
            .with_body("result b")
            .create_async()
            .await;

        let report = invoker(&server.url()).batch_query(&["a", "b"]).await;

        assert_eq!(
            report,
            format!(
                "query 1: a\nresult: {}\n\nquery 2: b\nresult: result b\n\n",
                QUERY_FAILED_TEXT
            )
        );
    }

    #[tokio::test]
    async fn test_batch_query_empty() {
        let report = invoker("http://localhost:1").batch_query::<String>(&[]).await;
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"UP"}"#)
            .create_async()
            .await;

        let report = invoker(&server.url()).health_check().await;

        assert_eq!(report, r#"AgenticRag service status: {"status":"UP"}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_health_check_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let report = invoker(&server.url()).health_check().await;
        assert_eq!(report, "AgenticRag service status: service unavailable");
    }

    #[tokio::test]
    async fn test_base_url_path_is_kept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rag/health")
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let report = invoker(&format!("{}/rag/", server.url()))
            .health_check()
            .await;

        assert!(report.ends_with("ok"));
        mock.assert_async().await;
    }

    #[test]
    fn test_malformed_base_url_is_an_error() {
        let result = RagInvoker::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(InvokerError::InvalidBaseUrl { .. })));

        let result = RagInvoker::new("ftp://files.example.com", Duration::from_secs(1));
        assert!(matches!(result, Err(InvokerError::InvalidBaseUrl { .. })));
    }

    #[tokio::test]
    async fn test_sse_profile_overrides_target() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/query")
            .match_query(Matcher::UrlEncoded("q".into(), "hello".into()))
            .match_header("x-api-key", "secret")
            .with_status(200)
            .with_body("from profile")
            .create_async()
            .await;

        let profile = ServerProfile::try_from(
            ServerConfigRequest::new("svc1").sse(
                SseParams::new(server.url())
                    .timeout_seconds(5)
                    .header("X-Api-Key", "secret"),
            ),
        )
        .unwrap();

        let resolved = invoker("http://localhost:1")
            .for_profile(Some(&profile))
            .unwrap();
        assert_eq!(resolved.timeout(), Duration::from_secs(5));

        assert_eq!(resolved.query("hello").await, "from profile");
        mock.assert_async().await;
    }

    #[test]
    fn test_no_profile_keeps_defaults() {
        let base = invoker("http://localhost:8080");
        let resolved = base.for_profile(None).unwrap();
        assert_eq!(resolved.base_url(), base.base_url());
        assert_eq!(resolved.timeout(), base.timeout());
    }

    #[test]
    fn test_stdio_profile_is_unsupported() {
        let profile = ServerProfile::try_from(
            ServerConfigRequest::new("local").stdio(StdioParams::new("rag-mcp")),
        )
        .unwrap();

        let result = invoker("http://localhost:8080").for_profile(Some(&profile));
        assert!(matches!(
            result,
            Err(InvokerError::UnsupportedTransport(name, TransportKind::Stdio)) if name == "local"
        ));
    }

    #[test]
    fn test_invalid_profile_header() {
        let profile = ServerProfile::try_from(
            ServerConfigRequest::new("svc1").sse(SseParams::new("http://x").header("bad header", "v")),
        )
        .unwrap();

        let result = invoker("http://localhost:8080").for_profile(Some(&profile));
        assert!(matches!(result, Err(InvokerError::InvalidHeader { .. })));
    }
}
