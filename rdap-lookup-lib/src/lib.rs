//! # RDAP Lookup Library
//!
//! Looks up registration data for domain names over RDAP (RFC 9082/9083).
//!
//! The authoritative RDAP server for a TLD is found through the IANA
//! bootstrap registry, queried once, and the response is flattened into a
//! stable [`LookupResult`] alongside the untouched raw object.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rdap_lookup_lib::{LookupConfig, LookupService, StaticSnapshotSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = LookupService::from_source(&StaticSnapshotSource, LookupConfig::default()).await?;
//!     let result = service.lookup("example.com").await?;
//!
//!     println!("{} registered by {:?}", result.domain_name, result.registrar_name);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Bootstrap Registry**: immutable TLD → server index from a file, the
//!   built-in table, or the live IANA registry (`bootstrap-fetch`)
//! - **Lenient Parsing**: malformed optional members degrade to absent fields
//! - **Typed Errors**: every failure carries a machine-readable kind
//! - **Batch Lookups**: bounded concurrency over many domains

pub use config::{
    load_env_config, parse_bounded_timeout, parse_timeout_string, ConfigManager, DefaultsConfig,
    EnvConfig, FileConfig, MAX_TIMEOUT_SECS,
};
pub use error::{ErrorKind, LookupFailure, RdapLookupError};
pub use lookup::{BatchItem, LookupService};
pub use normalize::{format_event_date, normalize, QueryContext};
#[cfg(feature = "bootstrap-fetch")]
pub use protocols::HttpSnapshotSource;
pub use protocols::{
    BootstrapIndex, BootstrapSnapshot, FileSnapshotSource, HttpResponse, RdapExecutor,
    RdapRawObject, RdapTransport, ReqwestTransport, SnapshotSource, StaticSnapshotSource,
    TransportError, IANA_BOOTSTRAP_URL,
};
pub use types::{DnssecInfo, DomainQuery, DsRecord, LookupConfig, LookupResult, NameserverInfo};
pub use utils::{extract_tld, normalize_domain, validate_domain};

pub mod protocols;

mod config;
mod error;
mod lookup;
mod normalize;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, RdapLookupError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        features: get_enabled_features(),
    }
}

/// Information about the library build and features
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub features: Vec<&'static str>,
}

#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "bootstrap-fetch")]
    features.push("bootstrap-fetch");

    features
}
