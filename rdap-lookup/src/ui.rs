//! Human-readable display logic for the rdap-lookup CLI.
//!
//! Colored result blocks, failure lines and the batch summary. Uses only the
//! `console` crate. Nothing here changes the data; status values are
//! reformatted for reading only.

use console::{pad_str, style, Alignment};
use rdap_lookup_lib::{LookupFailure, LookupResult};
use std::time::Duration;

const LABEL_WIDTH: usize = 13;

// ── Result block ─────────────────────────────────────────────────────────────

/// Print one successful lookup.
pub fn print_result(result: &LookupResult, show_raw: bool) -> Result<(), serde_json::Error> {
    println!(
        "{}  {}",
        style(&result.domain_name).white().bold(),
        style(format!("{}ms via {}", result.query_time_ms, result.rdap_server)).dim(),
    );

    if !result.status_codes.is_empty() {
        let statuses: Vec<String> = result
            .status_codes
            .iter()
            .map(|s| humanize_status(s))
            .collect();
        print_field("Status", &statuses.join(", "));
    }

    if let Some(registrar) = format_registrar(result) {
        print_field("Registrar", &registrar);
    }
    if let Some(handle) = &result.registry_handle {
        print_field("Handle", handle);
    }

    print_date("Registered", result.registration_date.as_deref());
    print_date("Expires", result.expiration_date.as_deref());
    print_date("Changed", result.last_changed_date.as_deref());
    print_date("DB updated", result.rdap_database_updated_date.as_deref());

    for (i, ns) in result.nameservers.iter().enumerate() {
        let label = if i == 0 { "Nameservers" } else { "" };
        let addresses: Vec<&str> = ns
            .ipv4
            .iter()
            .chain(ns.ipv6.iter())
            .map(String::as_str)
            .collect();
        if addresses.is_empty() {
            print_field(label, &ns.name);
        } else {
            print_field(
                label,
                &format!("{} {}", ns.name, style(format!("({})", addresses.join(", "))).dim()),
            );
        }
    }

    print_field("DNSSEC", &format_dnssec(result));

    for warning in &result.warnings {
        println!("  {} {}", style("!").yellow().bold(), style(warning).yellow());
    }

    if show_raw {
        println!("{}", style("  Raw RDAP object:").dim());
        println!("{}", serde_json::to_string_pretty(&result.raw_object)?);
    }

    println!();
    Ok(())
}

fn print_field(label: &str, value: &str) {
    let padded = pad_str(label, LABEL_WIDTH, Alignment::Left, None);
    println!("  {} {}", style(padded).cyan(), value);
}

fn print_date(label: &str, value: Option<&str>) {
    if let Some(date) = value {
        print_field(label, date);
    }
}

// ── Failures ─────────────────────────────────────────────────────────────────

/// Print one failed lookup.
pub fn print_failure(query: &str, failure: &LookupFailure) {
    let timing = failure
        .query_time_ms
        .map(|ms| format!("  {}", style(format!("{}ms", ms)).dim()))
        .unwrap_or_default();

    println!(
        "{}  {}{}",
        style(query).white().bold(),
        style(failure.error_kind.as_str().to_uppercase()).red().bold(),
        timing,
    );
    println!("  {}", style(&failure.message).dim());
    println!();
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(total: usize, failed: usize, duration: Duration) {
    println!(
        "{}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "{} domain{} in {:.1}s  {}  {}  {}  {}",
        style(total).bold(),
        if total == 1 { "" } else { "s" },
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} found", total - failed)).green(),
        style("|").dim(),
        style(format!("{} failed", failed)).red(),
    );
}

/// Print the TLDs known to the bootstrap index.
pub fn print_tld_list(tlds: &[String], publication: Option<&str>) {
    let header = match publication {
        Some(published) => format!("{} TLDs (published {})", tlds.len(), published),
        None => format!("{} TLDs", tlds.len()),
    };
    println!("{}", style(header).yellow().bold());
    for tld in tlds {
        println!("  {}", tld);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Insert a space before each capital that follows a lowercase letter or
/// digit: "clientTransferProhibited" → "client Transfer Prohibited".
pub fn humanize_status(status: &str) -> String {
    let mut out = String::with_capacity(status.len() + 4);
    let mut prev: Option<char> = None;
    for c in status.chars() {
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Registrar name with its IANA id, if either is known.
pub fn format_registrar(result: &LookupResult) -> Option<String> {
    match (&result.registrar_name, &result.registrar_iana_id) {
        (Some(name), Some(id)) => Some(format!("{} (IANA {})", name, id)),
        (Some(name), None) => Some(name.clone()),
        (None, Some(id)) => Some(format!("IANA {}", id)),
        (None, None) => None,
    }
}

fn format_dnssec(result: &LookupResult) -> String {
    let count = result.dnssec.ds_records.len();
    match (result.dnssec.signed, count) {
        (false, _) => "unsigned".to_string(),
        (true, 0) => "signed".to_string(),
        (true, 1) => "signed (1 DS record)".to_string(),
        (true, n) => format!("signed ({} DS records)", n),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
