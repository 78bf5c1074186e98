//! Lookup orchestration.
//!
//! `LookupService` runs one pass per request:
//! validate → resolve endpoint → query → normalize. Client-input problems are
//! rejected before any network activity; everything after that is reported
//! exactly once, with no retries.

use crate::error::RdapLookupError;
use crate::normalize::{normalize, QueryContext};
use crate::protocols::rdap::{RdapExecutor, RdapTransport, ReqwestTransport};
use crate::protocols::registry::{BootstrapIndex, SnapshotSource};
use crate::types::{DomainQuery, LookupConfig, LookupResult};
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tracing::Instrument;

/// Outcome of one lookup in a batch, paired with the input it came from.
pub type BatchItem = (String, Result<LookupResult, RdapLookupError>);

/// Resolves, queries and normalizes RDAP domain data.
///
/// Cloning is cheap: the bootstrap index and transport are shared.
///
/// # Example
///
/// ```rust,no_run
/// use rdap_lookup_lib::{LookupConfig, LookupService, StaticSnapshotSource};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = LookupService::from_source(&StaticSnapshotSource, LookupConfig::default()).await?;
///     let result = service.lookup("example.com").await?;
///     println!("{} expires {:?}", result.domain_name, result.expiration_date);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct LookupService {
    index: Arc<BootstrapIndex>,
    executor: RdapExecutor,
    config: LookupConfig,
}

impl LookupService {
    /// Create a service that talks to RDAP servers over `reqwest`.
    pub fn new(index: Arc<BootstrapIndex>, config: LookupConfig) -> Result<Self, RdapLookupError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(index, transport, config))
    }

    /// Create a service with a custom transport.
    pub fn with_transport(
        index: Arc<BootstrapIndex>,
        transport: Arc<dyn RdapTransport>,
        config: LookupConfig,
    ) -> Self {
        let executor = RdapExecutor::new(transport, config.timeout);
        Self {
            index,
            executor,
            config,
        }
    }

    /// Load the bootstrap index from `source`, then create the service.
    pub async fn from_source(
        source: &dyn SnapshotSource,
        config: LookupConfig,
    ) -> Result<Self, RdapLookupError> {
        let index = BootstrapIndex::load(source).await?;
        Self::new(Arc::new(index), config)
    }

    pub fn index(&self) -> &BootstrapIndex {
        &self.index
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Look up a single domain.
    ///
    /// Dropping the returned future aborts the in-flight request; no partial
    /// result is produced.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` / `UnsupportedTld` before any network call
    /// - `NotFound`, `Upstream`, `Transport` after the call, with elapsed time
    pub async fn lookup(&self, domain: &str) -> Result<LookupResult, RdapLookupError> {
        let query = DomainQuery::parse(domain)?;
        let span = tracing::debug_span!("lookup", domain = %query);
        self.lookup_query(&query).instrument(span).await
    }

    async fn lookup_query(&self, query: &DomainQuery) -> Result<LookupResult, RdapLookupError> {
        let base_url = self.index.resolve(query.as_str())?;
        tracing::debug!(base_url, "resolved RDAP server");

        let success = self.executor.execute(base_url, query.as_str()).await?;

        let ctx = QueryContext {
            domain: query.as_str(),
            rdap_server: base_url,
            query_time_ms: success.query_time_ms,
        };
        let result = normalize(success.object, &ctx);
        tracing::debug!(
            query_time_ms = result.query_time_ms,
            warnings = result.warnings.len(),
            "lookup complete"
        );
        Ok(result)
    }

    /// Look up several domains, yielding results as they complete.
    ///
    /// At most `config.concurrency` lookups are in flight. Completion order is
    /// not related to input order.
    pub fn lookup_stream<'a>(
        &'a self,
        domains: &[String],
    ) -> Pin<Box<dyn Stream<Item = BatchItem> + Send + 'a>> {
        let domains = domains.to_vec();
        let stream = stream::iter(domains)
            .map(move |domain| async move {
                let result = self.lookup(&domain).await;
                (domain, result)
            })
            .buffer_unordered(self.config.concurrency.max(1));

        Box::pin(stream)
    }

    /// Look up several domains and return results in input order.
    pub async fn lookup_all(&self, domains: &[String]) -> Vec<BatchItem> {
        stream::iter(domains.iter().cloned())
            .map(move |domain| async move {
                let result = self.lookup(&domain).await;
                (domain, result)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::rdap::{HttpResponse, TransportError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
        status: u16,
    }

    #[async_trait]
    impl RdapTransport for CountingTransport {
        async fn get(&self, _url: &str, _accept: &str) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse {
                status: self.status,
                body: br#"{"ldhName":"example.com","status":["active"]}"#.to_vec(),
            })
        }
    }

    fn service(status: u16) -> (LookupService, Arc<CountingTransport>) {
        let index = BootstrapIndex::from_json(
            r#"{"services": [[["com"], ["https://rdap.example-registry.test/"]]]}"#,
        )
        .unwrap();
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
            status,
        });
        let service = LookupService::with_transport(
            Arc::new(index),
            transport.clone(),
            LookupConfig::default(),
        );
        (service, transport)
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let (service, transport) = service(200);
        let result = service.lookup("example.com").await.unwrap();
        assert_eq!(result.domain_name, "example.com");
        assert_eq!(result.status_codes, vec!["active"]);
        assert_eq!(result.rdap_server, "https://rdap.example-registry.test/");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_hits_network() {
        let (service, transport) = service(200);
        for input in ["", "   ", "not a domain", "example", "exa mple.com", "-bad.com"] {
            let err = service.lookup(input).await.unwrap_err();
            assert!(
                matches!(err, RdapLookupError::InvalidInput { .. }),
                "{:?} should be invalid input, got {:?}",
                input,
                err
            );
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsupported_tld_never_hits_network() {
        let (service, transport) = service(200);
        let err = service.lookup("example.zz").await.unwrap_err();
        match err {
            RdapLookupError::UnsupportedTld { tld } => assert_eq!(tld, "zz"),
            other => panic!("expected UnsupportedTld, got {:?}", other),
        }
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_lookup_all_preserves_order() {
        let (service, _) = service(200);
        let domains = vec![
            "a.com".to_string(),
            "bad input".to_string(),
            "b.zz".to_string(),
            "c.com".to_string(),
        ];
        let results = service.lookup_all(&domains).await;
        let names: Vec<&str> = results.iter().map(|(d, _)| d.as_str()).collect();
        assert_eq!(names, vec!["a.com", "bad input", "b.zz", "c.com"]);
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert!(results[2].1.is_err());
        assert!(results[3].1.is_ok());
    }

    #[tokio::test]
    async fn test_lookup_stream_yields_every_domain() {
        let (service, transport) = service(404);
        let domains: Vec<String> = (0..15).map(|i| format!("d{}.com", i)).collect();

        let mut seen: Vec<String> = service
            .lookup_stream(&domains)
            .map(|(domain, result)| {
                assert!(matches!(result, Err(RdapLookupError::NotFound { .. })));
                domain
            })
            .collect()
            .await;
        seen.sort();

        let mut expected = domains.clone();
        expected.sort();
        assert_eq!(seen, expected);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 15);
    }
}
