//! IANA bootstrap registry.
//!
//! A `BootstrapIndex` maps every TLD in a bootstrap snapshot to the RDAP base
//! URL chosen for it. The index is built once from a `SnapshotSource` and is
//! never mutated afterwards; share it behind an `Arc` and rebuild a new one to
//! pick up a fresh snapshot.

use crate::error::RdapLookupError;
#[cfg(feature = "bootstrap-fetch")]
use crate::types::LookupConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Published location of the IANA DNS bootstrap file.
pub const IANA_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// A bootstrap document in the IANA `dns.json` format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapSnapshot {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub publication: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// `[[tld, ...], [base_url, ...]]` pairs, in publication order
    pub services: Vec<(Vec<String>, Vec<String>)>,
}

impl BootstrapSnapshot {
    /// Parse a snapshot from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, RdapLookupError> {
        serde_json::from_str(json).map_err(|e| {
            RdapLookupError::bootstrap(format!("Invalid bootstrap snapshot: {}", e))
        })
    }
}

/// Where a bootstrap snapshot comes from.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn load(&self) -> Result<BootstrapSnapshot, RdapLookupError>;

    /// Short human description, used in logs.
    fn describe(&self) -> String;
}

/// Reads a snapshot file written by the external bootstrap refresh job.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn load(&self) -> Result<BootstrapSnapshot, RdapLookupError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RdapLookupError::file_error(
                self.path.to_string_lossy(),
                format!("Failed to read bootstrap snapshot: {}", e),
            )
        })?;
        BootstrapSnapshot::from_json(&content)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Built-in table of well-known registries, for running without a snapshot file.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotSource;

impl StaticSnapshotSource {
    pub fn snapshot() -> BootstrapSnapshot {
        let services = BUILTIN_SERVICES
            .iter()
            .map(|(tlds, urls)| {
                (
                    tlds.iter().map(|t| t.to_string()).collect(),
                    urls.iter().map(|u| u.to_string()).collect(),
                )
            })
            .collect();

        BootstrapSnapshot {
            version: Some("1.0".to_string()),
            publication: None,
            description: Some("built-in registry table".to_string()),
            services,
        }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn load(&self) -> Result<BootstrapSnapshot, RdapLookupError> {
        Ok(Self::snapshot())
    }

    fn describe(&self) -> String {
        "built-in registry table".to_string()
    }
}

/// Base URLs for popular TLDs, grouped by operator like the IANA file.
const BUILTIN_SERVICES: &[(&[&str], &[&str])] = &[
    (&["com"], &["https://rdap.verisign.com/com/v1/"]),
    (&["net"], &["https://rdap.verisign.com/net/v1/"]),
    (&["org"], &["https://rdap.publicinterestregistry.org/rdap/"]),
    (
        &["info", "ai", "io", "me", "zone", "digital"],
        &["https://rdap.identitydigital.services/rdap/"],
    ),
    (&["biz"], &["https://rdap.nic.biz/"]),
    (&["app", "dev", "page"], &["https://pubapi.registry.google/rdap/"]),
    (&["xyz"], &["https://rdap.centralnic.com/xyz/"]),
    (&["tech"], &["https://rdap.centralnic.com/tech/"]),
    (&["online"], &["https://rdap.centralnic.com/online/"]),
    (&["site"], &["https://rdap.centralnic.com/site/"]),
    (&["shop"], &["https://rdap.gmoregistry.net/rdap/"]),
    (&["us"], &["https://rdap.nic.us/"]),
    (&["uk"], &["https://rdap.nominet.uk/uk/"]),
    (&["ca"], &["https://rdap.ca.fury.ca/rdap/"]),
    (&["fr"], &["https://rdap.nic.fr/"]),
    (&["nl"], &["https://rdap.sidn.nl/"]),
    (&["br"], &["https://rdap.registro.br/"]),
    (&["cc"], &["https://tld-rdap.verisign.com/cc/v1/"]),
    (&["tv"], &["https://rdap.nic.tv/"]),
];

/// Downloads the live IANA bootstrap file.
#[cfg(feature = "bootstrap-fetch")]
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    url: String,
    timeout: std::time::Duration,
    client: reqwest::Client,
}

#[cfg(feature = "bootstrap-fetch")]
impl HttpSnapshotSource {
    /// Source for the IANA URL using the lookup deadline and user agent.
    pub fn iana(config: &LookupConfig) -> Result<Self, RdapLookupError> {
        Self::new(IANA_BOOTSTRAP_URL, config)
    }

    pub fn new<U: Into<String>>(url: U, config: &LookupConfig) -> Result<Self, RdapLookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RdapLookupError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            timeout: config.timeout,
            client,
        })
    }

    pub fn timeout(&self) -> std::time::Duration {
        self.timeout
    }
}

#[cfg(feature = "bootstrap-fetch")]
#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn load(&self) -> Result<BootstrapSnapshot, RdapLookupError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            RdapLookupError::bootstrap(format!("Failed to fetch bootstrap registry: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(RdapLookupError::bootstrap(format!(
                "Bootstrap registry returned HTTP {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            RdapLookupError::bootstrap(format!("Failed to read bootstrap registry: {}", e))
        })?;
        BootstrapSnapshot::from_json(&body)
    }

    fn describe(&self) -> String {
        format!("url {}", self.url)
    }
}

/// One snapshot entry after the tie-break has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// The selected base URL, always ending in `/`
    pub base_url: String,
    /// All candidates in snapshot order
    pub candidates: Vec<String>,
}

/// Immutable TLD → RDAP endpoint index.
#[derive(Debug, Clone, Default)]
pub struct BootstrapIndex {
    endpoints: HashMap<String, Arc<ServiceEndpoint>>,
    publication: Option<String>,
    version: Option<String>,
}

impl BootstrapIndex {
    /// Load a snapshot from `source` and index it.
    pub async fn load(source: &dyn SnapshotSource) -> Result<Self, RdapLookupError> {
        tracing::debug!(source = %source.describe(), "loading bootstrap snapshot");
        let snapshot = source.load().await?;
        let index = Self::from_snapshot(&snapshot);
        tracing::info!(
            source = %source.describe(),
            tlds = index.len(),
            publication = index.publication().unwrap_or("unknown"),
            "bootstrap index ready"
        );
        Ok(index)
    }

    /// Index an IANA bootstrap JSON document.
    pub fn from_json(json: &str) -> Result<Self, RdapLookupError> {
        Ok(Self::from_snapshot(&BootstrapSnapshot::from_json(json)?))
    }

    /// Build the index from a parsed snapshot.
    ///
    /// The base URL is chosen once per entry and shared by all of its TLDs.
    /// A TLD listed in several entries keeps the last one.
    pub fn from_snapshot(snapshot: &BootstrapSnapshot) -> Self {
        let mut endpoints = HashMap::new();

        for (tlds, urls) in &snapshot.services {
            let candidates: Vec<String> = urls
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .map(ensure_trailing_slash)
                .collect();

            let Some(base_url) = select_base_url(&candidates) else {
                tracing::debug!(?tlds, "skipping bootstrap entry without endpoints");
                continue;
            };

            let endpoint = Arc::new(ServiceEndpoint {
                base_url: base_url.to_string(),
                candidates: candidates.clone(),
            });

            for tld in tlds {
                let tld = tld.trim().trim_start_matches('.').to_lowercase();
                if tld.is_empty() || tld.contains('.') {
                    tracing::debug!(%tld, "skipping non-bare TLD in bootstrap entry");
                    continue;
                }
                endpoints.insert(tld, Arc::clone(&endpoint));
            }
        }

        Self {
            endpoints,
            publication: snapshot.publication.clone(),
            version: snapshot.version.clone(),
        }
    }

    /// Resolve a domain to the RDAP base URL for its TLD.
    ///
    /// Domains with fewer than two labels, or whose TLD has no entry, yield
    /// `UnsupportedTld`.
    pub fn resolve(&self, domain: &str) -> Result<&str, RdapLookupError> {
        let Some(tld) = crate::utils::extract_tld(domain) else {
            return Err(RdapLookupError::unsupported_tld(
                crate::utils::normalize_domain(domain),
            ));
        };

        match self.endpoints.get(&tld) {
            Some(endpoint) => Ok(endpoint.base_url.as_str()),
            None => Err(RdapLookupError::unsupported_tld(tld)),
        }
    }

    /// Look up a bare TLD.
    pub fn endpoint(&self, tld: &str) -> Option<&ServiceEndpoint> {
        self.endpoints
            .get(&tld.trim_start_matches('.').to_lowercase())
            .map(|e| e.as_ref())
    }

    /// All candidate base URLs for a TLD, in snapshot order.
    pub fn candidates(&self, tld: &str) -> Option<&[String]> {
        self.endpoint(tld).map(|e| e.candidates.as_slice())
    }

    pub fn contains_tld(&self, tld: &str) -> bool {
        self.endpoint(tld).is_some()
    }

    /// All indexed TLDs, sorted alphabetically.
    pub fn tlds(&self) -> Vec<String> {
        let mut tlds: Vec<String> = self.endpoints.keys().cloned().collect();
        tlds.sort();
        tlds
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// `publication` timestamp of the source snapshot.
    pub fn publication(&self) -> Option<&str> {
        self.publication.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Tie-break: first `https` candidate, else the first candidate.
pub fn select_base_url(candidates: &[String]) -> Option<&str> {
    candidates
        .iter()
        .find(|u| is_https(u))
        .or_else(|| candidates.first())
        .map(String::as_str)
}

fn is_https(url: &str) -> bool {
    url.get(..8)
        .map(|scheme| scheme.eq_ignore_ascii_case("https://"))
        .unwrap_or(false)
}

fn ensure_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    }
}
