//! RDAP protocol plumbing.
//!
//! This module contains the bootstrap registry used to find the
//! authoritative server for a TLD, the lenient RDAP response model,
//! and the query executor.

/// Lenient serde model of RDAP domain responses
pub mod model;

/// RDAP query execution and transport
pub mod rdap;

/// IANA bootstrap registry and TLD → server index
pub mod registry;

pub use model::RdapRawObject;
pub use rdap::{
    classify_response, HttpResponse, RdapExecutor, RdapSuccess, RdapTransport, ReqwestTransport,
    TransportError, RDAP_ACCEPT,
};
#[cfg(feature = "bootstrap-fetch")]
pub use registry::HttpSnapshotSource;
pub use registry::{
    select_base_url, BootstrapIndex, BootstrapSnapshot, FileSnapshotSource, ServiceEndpoint,
    SnapshotSource, StaticSnapshotSource, IANA_BOOTSTRAP_URL,
};
