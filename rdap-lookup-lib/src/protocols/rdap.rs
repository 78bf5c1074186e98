//! RDAP (Registration Data Access Protocol) query execution.
//!
//! The executor builds the domain query URL, sends a single GET through an
//! `RdapTransport`, measures how long the exchange took, and classifies the
//! outcome. There are no retries: every failure is reported once.

use crate::error::RdapLookupError;
use crate::protocols::model::RdapRawObject;
use crate::types::LookupConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Media type requested from RDAP servers.
pub const RDAP_ACCEPT: &str = "application/rdap+json";

/// Headroom the reqwest client timeout keeps over the executor deadline.
const CLIENT_TIMEOUT_HEADROOM: Duration = Duration::from_secs(2);

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The request never produced a response (DNS, connect, TLS, timeout...).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_connect() {
            Self::new(format!("connection failed: {}", err))
        } else {
            Self::new(format!("request failed: {}", err))
        }
    }
}

/// "Send GET, get status + body".
///
/// Dropping the returned future must abort the request.
#[async_trait]
pub trait RdapTransport: Send + Sync {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the configured user agent and deadline.
    pub fn new(config: &LookupConfig) -> Result<Self, RdapLookupError> {
        let client = reqwest::Client::builder()
            .timeout(client_timeout(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                RdapLookupError::config(format!("Failed to create RDAP HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RdapTransport for ReqwestTransport {
    async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// The executor enforces the real deadline; the client timeout only backstops it.
fn client_timeout(deadline: Duration) -> Duration {
    deadline.saturating_add(CLIENT_TIMEOUT_HEADROOM)
}

/// A 2xx answer with a parseable body.
#[derive(Debug, Clone)]
pub struct RdapSuccess {
    pub object: RdapRawObject,
    pub query_time_ms: u64,
}

/// Executes RDAP domain queries.
#[derive(Clone)]
pub struct RdapExecutor {
    transport: Arc<dyn RdapTransport>,
    timeout: Duration,
}

impl RdapExecutor {
    pub fn new(transport: Arc<dyn RdapTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `base_url` must end in `/`.
    pub fn query_url(base_url: &str, domain: &str) -> String {
        format!("{}domain/{}", base_url, domain)
    }

    /// Query `domain` at `base_url` and classify the answer.
    pub async fn execute(
        &self,
        base_url: &str,
        domain: &str,
    ) -> Result<RdapSuccess, RdapLookupError> {
        let url = Self::query_url(base_url, domain);
        tracing::debug!(%url, "sending RDAP request");

        let start = Instant::now();
        let outcome =
            tokio::time::timeout(self.timeout, self.transport.get(&url, RDAP_ACCEPT)).await;
        let query_time_ms = elapsed_ms(start);

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.timed_out => {
                tracing::warn!(%url, query_time_ms, error = %e, "RDAP request timed out");
                return Err(RdapLookupError::transport(
                    domain,
                    format!("request timed out: {}", e.message),
                    query_time_ms,
                ));
            }
            Ok(Err(e)) => {
                tracing::warn!(%url, query_time_ms, error = %e, "RDAP transport error");
                return Err(RdapLookupError::transport(domain, e.message, query_time_ms));
            }
            Err(_) => {
                tracing::warn!(%url, query_time_ms, "RDAP request timed out");
                return Err(RdapLookupError::transport(
                    domain,
                    format!("request timed out after {:?}", self.timeout),
                    query_time_ms,
                ));
            }
        };

        tracing::debug!(%url, status = response.status, query_time_ms, "RDAP response");
        classify_response(domain, response, query_time_ms)
    }
}

/// Map an HTTP response to success, not-found, or upstream error.
pub fn classify_response(
    domain: &str,
    response: HttpResponse,
    query_time_ms: u64,
) -> Result<RdapSuccess, RdapLookupError> {
    match response.status {
        404 => {
            tracing::info!(domain, query_time_ms, "domain not found");
            Err(RdapLookupError::not_found(domain, query_time_ms))
        }
        200..=299 => match RdapRawObject::from_slice(&response.body) {
            Ok(object) => Ok(RdapSuccess {
                object,
                query_time_ms,
            }),
            Err(reason) => {
                tracing::warn!(domain, query_time_ms, %reason, "unparseable RDAP response");
                Err(RdapLookupError::upstream_parse(
                    domain,
                    format!("Failed to parse RDAP response: {}", reason),
                    query_time_ms,
                ))
            }
        },
        status => {
            tracing::warn!(domain, status, query_time_ms, "RDAP server returned an error");
            Err(RdapLookupError::upstream_status(domain, status, query_time_ms))
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedTransport {
        response: Result<HttpResponse, TransportError>,
        delay: Duration,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedTransport {
        fn new(response: Result<HttpResponse, TransportError>) -> Self {
            Self {
                response,
                delay: Duration::ZERO,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RdapTransport for ScriptedTransport {
        async fn get(&self, url: &str, accept: &str) -> Result<HttpResponse, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), accept.to_string()));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.response.clone()
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        })
    }

    #[test]
    fn test_query_url() {
        assert_eq!(
            RdapExecutor::query_url("https://rdap.example-registry.test/", "example.com"),
            "https://rdap.example-registry.test/domain/example.com"
        );
    }

    #[test]
    fn test_classify_success() {
        let success = classify_response(
            "example.com",
            HttpResponse {
                status: 200,
                body: br#"{"ldhName":"example.com"}"#.to_vec(),
            },
            12,
        )
        .unwrap();
        assert_eq!(success.query_time_ms, 12);
        assert_eq!(success.object.get("ldhName").unwrap(), "example.com");
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify_response(
            "example.com",
            HttpResponse { status: 404, body: Vec::new() },
            8,
        )
        .unwrap_err();
        assert!(matches!(err, RdapLookupError::NotFound { query_time_ms: 8, .. }));
    }

    #[test]
    fn test_classify_upstream_status() {
        for status in [301u16, 400, 403, 429, 500, 503] {
            let err = classify_response(
                "example.com",
                HttpResponse { status, body: Vec::new() },
                3,
            )
            .unwrap_err();
            assert_eq!(err.status_code(), Some(status));
            assert_eq!(err.kind(), crate::error::ErrorKind::UpstreamError);
        }
    }

    #[test]
    fn test_classify_unparseable_body() {
        for body in ["<html>oops</html>", "[]", ""] {
            let err = classify_response(
                "example.com",
                HttpResponse { status: 200, body: body.as_bytes().to_vec() },
                3,
            )
            .unwrap_err();
            match err {
                RdapLookupError::Upstream { status_code, message, query_time_ms, .. } => {
                    assert_eq!(status_code, None);
                    assert!(message.contains("Failed to parse"));
                    assert_eq!(query_time_ms, 3);
                }
                other => panic!("expected Upstream, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_execute_sends_accept_header() {
        let transport = Arc::new(ScriptedTransport::new(ok(200, r#"{"handle":"H-1"}"#)));
        let executor = RdapExecutor::new(transport.clone(), Duration::from_secs(5));

        let success = executor
            .execute("https://rdap.example-registry.test/", "example.com")
            .await
            .unwrap();
        assert_eq!(success.object.get("handle").unwrap(), "H-1");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].0,
            "https://rdap.example-registry.test/domain/example.com"
        );
        assert_eq!(requests[0].1, "application/rdap+json");
    }

    #[tokio::test]
    async fn test_execute_transport_failure() {
        let transport = Arc::new(ScriptedTransport::new(Err(TransportError::new(
            "connection failed: dns error",
        ))));
        let executor = RdapExecutor::new(transport, Duration::from_secs(5));

        let err = executor
            .execute("https://rdap.example-registry.test/", "example.com")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TransportError);
        assert!(err.to_string().contains("dns error"));
        assert!(err.query_time_ms().is_some());
    }

    #[tokio::test]
    async fn test_execute_deadline() {
        let mut transport = ScriptedTransport::new(ok(200, "{}"));
        transport.delay = Duration::from_millis(500);
        let executor = RdapExecutor::new(Arc::new(transport), Duration::from_millis(20));

        let err = executor
            .execute("https://rdap.example-registry.test/", "example.com")
            .await
            .unwrap_err();
        match err {
            RdapLookupError::Transport { message, query_time_ms, .. } => {
                assert!(message.contains("timed out"));
                assert!(query_time_ms >= 20);
                assert!(query_time_ms < 500);
            }
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_transport_timeout_is_worded() {
        let transport = Arc::new(ScriptedTransport::new(Err(TransportError::timeout(
            "operation timed out",
        ))));
        let executor = RdapExecutor::new(transport, Duration::from_secs(5));

        let err = executor
            .execute("https://rdap.example-registry.test/", "example.com")
            .await
            .unwrap_err();
        match err {
            RdapLookupError::Transport { message, .. } => {
                assert!(message.starts_with("request timed out: "), "{}", message);
            }
            other => panic!("expected Transport, got {:?}", other),
        }
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(&LookupConfig::default()).is_ok());
    }

    #[test]
    fn test_huge_deadline_does_not_overflow() {
        assert_eq!(client_timeout(Duration::MAX), Duration::MAX);
        assert_eq!(client_timeout(Duration::from_secs(10)), Duration::from_secs(12));

        let config = LookupConfig::default().with_timeout(Duration::from_secs(u64::MAX));
        assert!(ReqwestTransport::new(&config).is_ok());
    }
}
