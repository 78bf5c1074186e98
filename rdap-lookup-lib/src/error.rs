//! Error handling for RDAP lookups.
//!
//! Every lookup ends in either a `LookupResult` or one of five terminal
//! failure kinds. Startup problems (bad snapshot, bad config file) have their
//! own variants and never surface from `lookup` itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for the library.
#[derive(Debug, Clone, Error)]
pub enum RdapLookupError {
    /// Malformed or empty domain. Never reaches the network.
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidInput { domain: String, reason: String },

    /// No bootstrap entry for the TLD. Never reaches the network.
    #[error("Unsupported TLD '{tld}': no RDAP server is registered for it")]
    UnsupportedTld { tld: String },

    /// The RDAP server answered 404: the domain is not registered.
    #[error("Domain '{domain}' was not found by the RDAP server")]
    NotFound { domain: String, query_time_ms: u64 },

    /// The server was reachable but answered with an unexpected status or body.
    #[error("RDAP server error for '{domain}': {message}")]
    Upstream {
        domain: String,
        message: String,
        status_code: Option<u16>,
        query_time_ms: u64,
    },

    /// DNS, connect, TLS or timeout failure reaching the server.
    #[error("Transport error for '{domain}': {message}")]
    Transport {
        domain: String,
        message: String,
        query_time_ms: u64,
    },

    /// The bootstrap snapshot could not be loaded or parsed.
    #[error("Bootstrap error: {message}")]
    Bootstrap { message: String },

    /// Invalid settings.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors when reading snapshots or config files.
    #[error("File error at '{path}': {message}")]
    File { path: String, message: String },
}

impl RdapLookupError {
    /// Create a new invalid input error.
    pub fn invalid_input<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidInput {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported TLD error.
    pub fn unsupported_tld<T: Into<String>>(tld: T) -> Self {
        Self::UnsupportedTld { tld: tld.into() }
    }

    /// Create a new not-found answer.
    pub fn not_found<D: Into<String>>(domain: D, query_time_ms: u64) -> Self {
        Self::NotFound {
            domain: domain.into(),
            query_time_ms,
        }
    }

    /// Create an upstream error for an unexpected HTTP status.
    pub fn upstream_status<D: Into<String>>(
        domain: D,
        status_code: u16,
        query_time_ms: u64,
    ) -> Self {
        Self::Upstream {
            domain: domain.into(),
            message: format!("server returned HTTP {}", status_code),
            status_code: Some(status_code),
            query_time_ms,
        }
    }

    /// Create an upstream error for a body that could not be parsed.
    pub fn upstream_parse<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        query_time_ms: u64,
    ) -> Self {
        Self::Upstream {
            domain: domain.into(),
            message: message.into(),
            status_code: None,
            query_time_ms,
        }
    }

    /// Create a new transport error.
    pub fn transport<D: Into<String>, M: Into<String>>(
        domain: D,
        message: M,
        query_time_ms: u64,
    ) -> Self {
        Self::Transport {
            domain: domain.into(),
            message: message.into(),
            query_time_ms,
        }
    }

    /// Create a new bootstrap error.
    pub fn bootstrap<M: Into<String>>(message: M) -> Self {
        Self::Bootstrap {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Machine-distinguishable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::UnsupportedTld { .. } => ErrorKind::UnsupportedTld,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::Transport { .. } => ErrorKind::TransportError,
            Self::Bootstrap { .. } | Self::Config { .. } | Self::File { .. } => {
                ErrorKind::Configuration
            }
        }
    }

    /// Elapsed query time, present only once the HTTP exchange was attempted.
    pub fn query_time_ms(&self) -> Option<u64> {
        match self {
            Self::NotFound { query_time_ms, .. }
            | Self::Upstream { query_time_ms, .. }
            | Self::Transport { query_time_ms, .. } => Some(*query_time_ms),
            _ => None,
        }
    }

    /// HTTP status code reported by the upstream server, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Upstream { status_code, .. } => *status_code,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Whether the error was raised before any network activity.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::UnsupportedTld { .. })
    }

    /// Serializable failure record for the presentation layer.
    pub fn to_failure(&self) -> LookupFailure {
        LookupFailure {
            error_kind: self.kind(),
            message: self.to_string(),
            query_time_ms: self.query_time_ms(),
        }
    }
}

/// Failure kinds exposed to callers of `lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidInput,
    UnsupportedTld,
    NotFound,
    UpstreamError,
    TransportError,
    /// Startup-only: snapshot, config or file problems.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid-input",
            Self::UnsupportedTld => "unsupported-tld",
            Self::NotFound => "not-found",
            Self::UpstreamError => "upstream-error",
            Self::TransportError => "transport-error",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The externally visible failure shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupFailure {
    pub error_kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_time_ms: Option<u64>,
}

impl From<&RdapLookupError> for LookupFailure {
    fn from(err: &RdapLookupError) -> Self {
        err.to_failure()
    }
}

impl From<RdapLookupError> for LookupFailure {
    fn from(err: RdapLookupError) -> Self {
        err.to_failure()
    }
}

impl From<serde_json::Error> for RdapLookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::bootstrap(format!("JSON parsing failed: {}", err))
    }
}

impl From<toml::de::Error> for RdapLookupError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("Failed to parse TOML configuration: {}", err))
    }
}

impl From<std::io::Error> for RdapLookupError {
    fn from(err: std::io::Error) -> Self {
        Self::file_error("<unknown>", err.to_string())
    }
}
