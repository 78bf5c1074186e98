//! Utility functions for domain processing and validation.

use crate::error::RdapLookupError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One DNS label: alphanumeric, hyphens only between alphanumerics.
    static ref LABEL_RE: Regex = Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$")
        .expect("label pattern is valid");
}

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Trim surrounding whitespace and lowercase.
pub fn normalize_domain(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Validate an already-normalized domain name.
///
/// Each label must be alphanumeric with optional internal hyphens and there
/// must be at least two labels. No trailing dot, no whitespace.
pub fn validate_domain(domain: &str) -> Result<(), RdapLookupError> {
    if domain.is_empty() {
        return Err(RdapLookupError::invalid_input(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.len() > MAX_DOMAIN_LEN {
        return Err(RdapLookupError::invalid_input(
            domain,
            format!("Domain name exceeds {} characters", MAX_DOMAIN_LEN),
        ));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(RdapLookupError::invalid_input(
            domain,
            "Domain must contain at least two labels",
        ));
    }

    for label in labels {
        if label.is_empty() {
            return Err(RdapLookupError::invalid_input(domain, "Empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(RdapLookupError::invalid_input(
                domain,
                format!("Label '{}' exceeds {} characters", label, MAX_LABEL_LEN),
            ));
        }
        if !LABEL_RE.is_match(label) {
            return Err(RdapLookupError::invalid_input(
                domain,
                format!(
                    "Label '{}' must be alphanumeric with optional internal hyphens",
                    label
                ),
            ));
        }
    }

    Ok(())
}

/// Extract the TLD (text after the final dot) from a domain name.
///
/// Returns `None` when the domain has fewer than two labels.
pub fn extract_tld(domain: &str) -> Option<String> {
    let domain = normalize_domain(domain);
    let (rest, tld) = domain.rsplit_once('.')?;
    if rest.is_empty() || tld.is_empty() {
        return None;
    }
    Some(tld.to_string())
}
