//! Response normalization.
//!
//! Turns a raw RDAP domain object into the canonical `LookupResult`.
//! Normalization is total: missing or malformed optional fields become
//! absent values (and, where useful, a warning), never an error.

use crate::protocols::model::{RdapDomain, RdapEntity, RdapRawObject};
use crate::types::{DnssecInfo, DsRecord, LookupResult, NameserverInfo};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Public identifier type carrying the registrar's IANA number.
const IANA_REGISTRAR_ID: &str = "IANA Registrar ID";

/// Lifecycle event slots on the canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventSlot {
    Registration,
    Expiration,
    LastChanged,
    RdapDatabaseUpdated,
}

impl EventSlot {
    fn from_action(action: &str) -> Option<Self> {
        match action {
            "registration" => Some(Self::Registration),
            "expiration" => Some(Self::Expiration),
            "last changed" => Some(Self::LastChanged),
            "last update of RDAP database" => Some(Self::RdapDatabaseUpdated),
            _ => None,
        }
    }
}

/// Context for a single normalization that isn't part of the RDAP object.
#[derive(Debug, Clone)]
pub struct QueryContext<'a> {
    /// The domain that was queried, used when the object has no `ldhName`
    pub domain: &'a str,
    /// Base URL of the server that answered
    pub rdap_server: &'a str,
    pub query_time_ms: u64,
}

/// Normalize a raw RDAP object into a `LookupResult`.
pub fn normalize(raw: RdapRawObject, ctx: &QueryContext<'_>) -> LookupResult {
    let domain = raw.domain();
    let mut warnings = Vec::new();

    note_dropped(
        &mut warnings,
        dropped_count(raw.get("status"), domain.status.len()),
        "status entries",
    );
    note_dropped(
        &mut warnings,
        dropped_count(raw.get("nameservers"), domain.nameservers.len()),
        "nameserver entries",
    );
    if let Some(secure) = &domain.secure_dns {
        let raw_ds = raw.get("secureDNS").and_then(|s| s.get("dsData"));
        note_dropped(
            &mut warnings,
            dropped_count(raw_ds, secure.ds_data.len()),
            "DS records",
        );
    }

    let registrar = find_registrar(&domain);
    let registrar_name = registrar.and_then(registrar_name);
    let registrar_iana_id = registrar.and_then(registrar_iana_id);

    let mut registration_date = None;
    let mut expiration_date = None;
    let mut last_changed_date = None;
    let mut rdap_database_updated_date = None;

    for event in &domain.events {
        let Some(slot) = event.event_action.as_deref().and_then(EventSlot::from_action) else {
            continue;
        };
        let action = event.event_action.as_deref().unwrap_or_default();

        let formatted = match event.event_date.as_deref() {
            Some(timestamp) => match format_event_date(timestamp) {
                Some(date) => Some(date),
                None => {
                    tracing::warn!(action, timestamp, "unparseable RDAP event timestamp");
                    warnings.push(format!(
                        "event '{}' has an unparseable date '{}'",
                        action, timestamp
                    ));
                    None
                }
            },
            None => {
                warnings.push(format!("event '{}' has no date", action));
                None
            }
        };

        // Later events overwrite earlier ones in the same slot.
        match slot {
            EventSlot::Registration => registration_date = formatted,
            EventSlot::Expiration => expiration_date = formatted,
            EventSlot::LastChanged => last_changed_date = formatted,
            EventSlot::RdapDatabaseUpdated => rdap_database_updated_date = formatted,
        }
    }

    let nameservers = domain
        .nameservers
        .iter()
        .filter_map(|ns| {
            let name = ns.ldh_name.clone().or_else(|| ns.unicode_name.clone());
            if name.is_none() {
                tracing::warn!("RDAP nameserver entry has no name");
                warnings.push("nameserver entry without a name was skipped".to_string());
            }
            let addresses = ns.ip_addresses.clone().unwrap_or_default();
            Some(NameserverInfo {
                name: name?,
                ipv4: addresses.v4,
                ipv6: addresses.v6,
            })
        })
        .collect();

    let dnssec = domain
        .secure_dns
        .as_ref()
        .map(|secure| DnssecInfo {
            signed: secure.delegation_signed.unwrap_or(false),
            ds_records: secure
                .ds_data
                .iter()
                .map(|ds| DsRecord {
                    key_tag: ds.key_tag,
                    algorithm: ds.algorithm,
                    digest_type: ds.digest_type,
                    digest: ds.digest.clone(),
                })
                .collect(),
        })
        .unwrap_or_default();

    LookupResult {
        domain_name: domain
            .ldh_name
            .clone()
            .unwrap_or_else(|| ctx.domain.to_string()),
        registry_handle: domain.handle.clone(),
        status_codes: domain.status.clone(),
        query_time_ms: ctx.query_time_ms,
        rdap_server: ctx.rdap_server.to_string(),
        registration_date,
        expiration_date,
        last_changed_date,
        rdap_database_updated_date,
        nameservers,
        registrar_name,
        registrar_iana_id,
        dnssec,
        warnings,
        raw_object: raw,
    }
}

/// Elements of a raw JSON array that the typed view could not decode.
fn dropped_count(raw: Option<&Value>, kept: usize) -> usize {
    raw.and_then(Value::as_array)
        .map_or(0, |items| items.len().saturating_sub(kept))
}

fn note_dropped(warnings: &mut Vec<String>, count: usize, what: &str) {
    if count > 0 {
        tracing::warn!(count, what, "malformed RDAP list elements skipped");
        warnings.push(format!("{} {} could not be read and were skipped", count, what));
    }
}

/// The first entity holding the `registrar` role. Later ones are ignored.
fn find_registrar(domain: &RdapDomain) -> Option<&RdapEntity> {
    domain.entities.iter().find(|e| e.has_role("registrar"))
}

fn registrar_name(entity: &RdapEntity) -> Option<String> {
    entity
        .vcard_property("fn")
        .and_then(|p| p.value.as_text())
        .map(String::from)
}

fn registrar_iana_id(entity: &RdapEntity) -> Option<String> {
    entity
        .public_ids
        .iter()
        .find(|id| id.id_type.as_deref() == Some(IANA_REGISTRAR_ID))
        .and_then(|id| id.identifier.clone())
}

/// Format an ISO-8601 timestamp as a long-form UTC date ("January 5, 2024").
///
/// Accepts RFC 3339 with offset, a naive date-time (read as UTC) and a bare
/// date. Returns `None` for anything else.
pub fn format_event_date(timestamp: &str) -> Option<String> {
    let timestamp = timestamp.trim();
    let date = if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        dt.with_timezone(&Utc).date_naive()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        dt.date()
    } else if let Ok(date) = NaiveDate::parse_from_str(timestamp, "%Y-%m-%d") {
        date
    } else {
        return None;
    };
    Some(date.format("%B %-d, %Y").to_string())
}
