//! Core data types for RDAP lookups.
//!
//! This module defines the validated query, the canonical result record
//! returned to callers, and the runtime configuration.

use crate::error::RdapLookupError;
use crate::protocols::model::RdapRawObject;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A validated, lowercase domain name with at least two labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainQuery(String);

impl DomainQuery {
    /// Trim, lowercase and validate raw user input.
    pub fn parse(input: &str) -> Result<Self, RdapLookupError> {
        let normalized = crate::utils::normalize_domain(input);
        crate::utils::validate_domain(&normalized)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final label of the domain.
    pub fn tld(&self) -> &str {
        // Validation guarantees at least one dot.
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for DomainQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DomainQuery {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonical, UI-friendly result of a successful lookup.
///
/// Optional fields serialize as `null` so consumers can tell "absent"
/// apart from an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    /// `ldhName` from the RDAP object, or the queried domain when missing
    pub domain_name: String,

    /// Registry object handle (e.g. "2336799_DOMAIN_COM-VRSN")
    pub registry_handle: Option<String>,

    /// RDAP status values, verbatim and in source order
    pub status_codes: Vec<String>,

    /// Time spent on the HTTP exchange
    pub query_time_ms: u64,

    /// Base URL of the RDAP server that answered
    pub rdap_server: String,

    pub registration_date: Option<String>,
    pub expiration_date: Option<String>,
    pub last_changed_date: Option<String>,
    pub rdap_database_updated_date: Option<String>,

    pub nameservers: Vec<NameserverInfo>,

    pub registrar_name: Option<String>,
    pub registrar_iana_id: Option<String>,

    pub dnssec: DnssecInfo,

    /// Non-fatal issues found while normalizing (e.g. unparseable dates)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// The upstream object, unmodified
    pub raw_object: RdapRawObject,
}

/// A nameserver with its glue addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameserverInfo {
    pub name: String,
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
}

/// DNSSEC delegation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnssecInfo {
    pub signed: bool,
    pub ds_records: Vec<DsRecord>,
}

/// A DS record, passed through as the server reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DsRecord {
    pub key_tag: u32,
    pub algorithm: u32,
    pub digest_type: u32,
    pub digest: String,
}

/// Runtime configuration for a lookup service.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Deadline for a single RDAP request
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Maximum lookups in flight for batch operations
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// User-Agent header sent to RDAP servers
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            concurrency: 10,
            user_agent: format!("rdap-lookup/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LookupConfig {
    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the batch concurrency, clamped to 1..=100.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_query_lowercases() {
        let query = DomainQuery::parse("  EXAMPLE.COM ").unwrap();
        assert_eq!(query.as_str(), "example.com");
        assert_eq!(query.tld(), "com");
    }

    #[test]
    fn test_domain_query_rejects_bad_input() {
        assert!(DomainQuery::parse("").is_err());
        assert!(DomainQuery::parse("not a domain").is_err());
        assert!(DomainQuery::parse("localhost").is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = LookupConfig::default()
            .with_timeout(Duration::from_secs(3))
            .with_concurrency(500)
            .with_user_agent("test-agent");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.concurrency, 100);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn test_config_defaults() {
        let config = LookupConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.concurrency, 10);
        assert!(config.user_agent.starts_with("rdap-lookup/"));
    }
}
