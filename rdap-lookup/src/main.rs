//! RDAP Lookup CLI Application
//!
//! A command-line interface for looking up domain registration data over RDAP.
//! This CLI application provides a user-friendly interface to the rdap-lookup-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use rdap_lookup_lib::{
    load_env_config, parse_bounded_timeout, BootstrapIndex, ConfigManager, EnvConfig,
    FileConfig, FileSnapshotSource, HttpSnapshotSource, LookupConfig, LookupFailure,
    LookupResult, LookupService, RdapLookupError, StaticSnapshotSource, MAX_TIMEOUT_SECS,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit code when every lookup succeeded.
const EXIT_OK: i32 = 0;
/// Exit code when at least one lookup failed.
const EXIT_LOOKUP_FAILED: i32 = 1;
/// Exit code for configuration, bootstrap and usage errors.
const EXIT_STARTUP: i32 = 2;

/// CLI arguments for rdap-lookup
#[derive(Parser, Debug)]
#[command(name = "rdap-lookup")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up domain registration data over RDAP")]
#[command(
    long_about = "Look up domain registration data over RDAP.\n\nThe authoritative server for each TLD is found through the IANA bootstrap registry; responses are normalized into registrar, dates, nameservers and DNSSEC data."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Fully qualified domain names to look up
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// IANA bootstrap snapshot (dns.json) to resolve TLDs with
    #[arg(
        long = "bootstrap",
        value_name = "FILE",
        help_heading = "Bootstrap",
        conflicts_with = "fetch_bootstrap"
    )]
    pub bootstrap: Option<PathBuf>,

    /// Download the live IANA bootstrap registry before looking up
    #[arg(long = "fetch-bootstrap", help_heading = "Bootstrap")]
    pub fetch_bootstrap: bool,

    /// List the TLDs the bootstrap index knows about and exit
    #[arg(long = "list-tlds", help_heading = "Bootstrap")]
    pub list_tlds: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Include the raw RDAP object in the output
    #[arg(long = "raw", help_heading = "Output Format")]
    pub raw: bool,

    /// Request deadline (e.g. "10s", "1m")
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Max concurrent lookups (default: 10, max: 100)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything resolved from config files, environment and flags.
#[derive(Debug, Clone)]
struct Settings {
    lookup: LookupConfig,
    bootstrap_file: Option<PathBuf>,
    fetch_bootstrap: bool,
    pretty: bool,
    raw: bool,
}

/// One line of `--json` output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntry {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<LookupFailure>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_STARTUP
        }
    };
    process::exit(code);
}

/// Install the stderr log subscriber. `--verbose` wins over `RUST_LOG`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    validate_args(&args)?;

    let lib_info = rdap_lookup_lib::info();
    tracing::debug!(
        version = lib_info.version,
        features = ?lib_info.features,
        "rdap-lookup starting"
    );

    let settings = build_settings(&args)?;
    let index = load_index(&settings).await?;
    tracing::debug!(
        tlds = index.len(),
        publication = index.publication().unwrap_or("-"),
        "bootstrap index ready"
    );

    if args.list_tlds {
        print_tlds(&index, settings.pretty)?;
        return Ok(EXIT_OK);
    }

    let service = LookupService::new(Arc::new(index), settings.lookup.clone())?;

    let start = Instant::now();
    let results = service.lookup_all(&args.domains).await;
    let duration = start.elapsed();

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    if settings.pretty {
        display_text_results(&results, settings.raw, duration)?;
    } else {
        display_json_results(&results, settings.raw)?;
    }

    Ok(if failed == 0 { EXIT_OK } else { EXIT_LOOKUP_FAILED })
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    // --list-tlds is self-contained, skip other validation
    if args.list_tlds {
        return Ok(());
    }

    if args.domains.is_empty() {
        return Err("You must specify at least one domain name (or --list-tlds)".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 100 {
            return Err("Concurrency must be between 1 and 100".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if parse_bounded_timeout(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m' (at most {}s)",
                timeout, MAX_TIMEOUT_SECS
            ));
        }
    }

    Ok(())
}

/// Resolve settings with precedence CLI > environment > config file > defaults.
fn build_settings(args: &Args) -> Result<Settings, RdapLookupError> {
    let config_manager = ConfigManager::new(args.verbose);

    let file_config = match &args.config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using explicit config file");
            config_manager.load_file(path)?
        }
        None => config_manager.discover_and_load()?,
    };
    let env_config = load_env_config();

    Ok(resolve_settings(args, &file_config, &env_config))
}

fn resolve_settings(args: &Args, file_config: &FileConfig, env_config: &EnvConfig) -> Settings {
    let mut lookup = env_config.apply_to(file_config.apply_to(LookupConfig::default()));

    if let Some(secs) = args.timeout.as_deref().and_then(parse_bounded_timeout) {
        lookup = lookup.with_timeout(Duration::from_secs(secs));
    }
    if let Some(concurrency) = args.concurrency {
        lookup = lookup.with_concurrency(concurrency);
    }

    let bootstrap_file = args
        .bootstrap
        .clone()
        .or_else(|| env_config.bootstrap_file.clone())
        .or_else(|| file_config.bootstrap_file().map(|p| p.to_path_buf()));

    let defaults = file_config.defaults.as_ref();
    let pretty = if args.json {
        false
    } else {
        env_config
            .pretty
            .or_else(|| defaults.and_then(|d| d.pretty))
            .unwrap_or(true)
    };
    let raw = args.raw || defaults.and_then(|d| d.raw).unwrap_or(false);

    Settings {
        lookup,
        // --fetch-bootstrap ignores snapshot files from env and config
        bootstrap_file: if args.fetch_bootstrap {
            None
        } else {
            bootstrap_file
        },
        fetch_bootstrap: args.fetch_bootstrap,
        pretty,
        raw,
    }
}

async fn load_index(settings: &Settings) -> Result<BootstrapIndex, RdapLookupError> {
    if settings.fetch_bootstrap {
        let source = HttpSnapshotSource::iana(&settings.lookup)?;
        return BootstrapIndex::load(&source).await;
    }

    match &settings.bootstrap_file {
        Some(path) => BootstrapIndex::load(&FileSnapshotSource::new(path)).await,
        None => BootstrapIndex::load(&StaticSnapshotSource).await,
    }
}

fn print_tlds(index: &BootstrapIndex, pretty: bool) -> Result<(), serde_json::Error> {
    let tlds = index.tlds();
    if pretty {
        ui::print_tld_list(&tlds, index.publication());
    } else {
        println!("{}", serde_json::to_string_pretty(&tlds)?);
    }
    Ok(())
}

/// Display results in JSON format
fn display_json_results(
    results: &[(String, Result<LookupResult, RdapLookupError>)],
    include_raw: bool,
) -> Result<(), serde_json::Error> {
    let entries = results
        .iter()
        .map(|(query, outcome)| json_entry(query, outcome, include_raw))
        .collect::<Result<Vec<_>, _>>()?;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn json_entry(
    query: &str,
    outcome: &Result<LookupResult, RdapLookupError>,
    include_raw: bool,
) -> Result<JsonEntry, serde_json::Error> {
    match outcome {
        Ok(result) => {
            let mut value = serde_json::to_value(result)?;
            if !include_raw {
                if let Some(object) = value.as_object_mut() {
                    object.remove("rawObject");
                }
            }
            Ok(JsonEntry {
                query: query.to_string(),
                result: Some(value),
                error: None,
            })
        }
        Err(e) => Ok(JsonEntry {
            query: query.to_string(),
            result: None,
            error: Some(e.to_failure()),
        }),
    }
}

/// Display results in human-readable text format
fn display_text_results(
    results: &[(String, Result<LookupResult, RdapLookupError>)],
    include_raw: bool,
    duration: Duration,
) -> Result<(), serde_json::Error> {
    for (query, outcome) in results {
        match outcome {
            Ok(result) => ui::print_result(result, include_raw)?,
            Err(e) => ui::print_failure(query, &e.to_failure()),
        }
    }

    if results.len() > 1 {
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        ui::print_summary(results.len(), failed, duration);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdap_lookup_lib::DefaultsConfig;

    fn create_test_args() -> Args {
        Args {
            domains: vec!["example.com".to_string()],
            bootstrap: None,
            fetch_bootstrap: false,
            list_tlds: false,
            json: false,
            raw: false,
            timeout: None,
            concurrency: None,
            config: None,
            verbose: false,
        }
    }

    fn file_config(defaults: DefaultsConfig) -> FileConfig {
        FileConfig {
            defaults: Some(defaults),
        }
    }

    #[test]
    fn test_validate_args_requires_domains() {
        let args = Args {
            domains: vec![],
            ..create_test_args()
        };
        assert!(validate_args(&args).is_err());

        let args = Args {
            domains: vec![],
            list_tlds: true,
            ..create_test_args()
        };
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_values() {
        let args = Args {
            concurrency: Some(0),
            ..create_test_args()
        };
        assert!(validate_args(&args).is_err());

        let args = Args {
            timeout: Some("soon".to_string()),
            ..create_test_args()
        };
        assert!(validate_args(&args).is_err());

        for timeout in ["18446744073709551615", "307445734561825861m", "2h", "3601s"] {
            let args = Args {
                timeout: Some(timeout.to_string()),
                ..create_test_args()
            };
            assert!(validate_args(&args).is_err(), "{} should be rejected", timeout);
        }

        let args = Args {
            timeout: Some("30s".to_string()),
            concurrency: Some(50),
            ..create_test_args()
        };
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_settings_defaults() {
        let settings =
            resolve_settings(&create_test_args(), &FileConfig::default(), &EnvConfig::default());
        assert_eq!(settings.lookup.timeout, Duration::from_secs(10));
        assert_eq!(settings.lookup.concurrency, 10);
        assert!(settings.pretty);
        assert!(!settings.raw);
        assert!(settings.bootstrap_file.is_none());
    }

    #[test]
    fn test_settings_precedence() {
        let file = file_config(DefaultsConfig {
            timeout: Some("5s".to_string()),
            concurrency: Some(20),
            bootstrap_file: Some(PathBuf::from("/from/file.json")),
            pretty: Some(false),
            raw: Some(true),
            ..Default::default()
        });
        let env = EnvConfig {
            concurrency: Some(30),
            bootstrap_file: Some(PathBuf::from("/from/env.json")),
            ..Default::default()
        };

        // File and env only
        let settings = resolve_settings(&create_test_args(), &file, &env);
        assert_eq!(settings.lookup.timeout, Duration::from_secs(5));
        assert_eq!(settings.lookup.concurrency, 30);
        assert_eq!(settings.bootstrap_file, Some(PathBuf::from("/from/env.json")));
        assert!(!settings.pretty);
        assert!(settings.raw);

        // CLI wins
        let args = Args {
            timeout: Some("1m".to_string()),
            concurrency: Some(40),
            bootstrap: Some(PathBuf::from("/from/cli.json")),
            ..create_test_args()
        };
        let settings = resolve_settings(&args, &file, &env);
        assert_eq!(settings.lookup.timeout, Duration::from_secs(60));
        assert_eq!(settings.lookup.concurrency, 40);
        assert_eq!(settings.bootstrap_file, Some(PathBuf::from("/from/cli.json")));
    }

    #[test]
    fn test_json_flag_overrides_pretty() {
        let env = EnvConfig {
            pretty: Some(true),
            ..Default::default()
        };
        let args = Args {
            json: true,
            ..create_test_args()
        };
        let settings = resolve_settings(&args, &FileConfig::default(), &env);
        assert!(!settings.pretty);
    }

    #[test]
    fn test_fetch_bootstrap_ignores_snapshot_file() {
        let env = EnvConfig {
            bootstrap_file: Some(PathBuf::from("/from/env.json")),
            ..Default::default()
        };
        let args = Args {
            fetch_bootstrap: true,
            ..create_test_args()
        };
        let settings = resolve_settings(&args, &FileConfig::default(), &env);
        assert!(settings.fetch_bootstrap);
        assert!(settings.bootstrap_file.is_none());
    }

    #[test]
    fn test_json_entry_failure_shape() {
        let outcome = Err(RdapLookupError::not_found("example.com", 42));
        let entry = json_entry("example.com", &outcome, false).unwrap();
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["query"], "example.com");
        assert_eq!(value["error"]["errorKind"], "not-found");
        assert_eq!(value["error"]["queryTimeMs"], 42);
        assert!(value.get("result").is_none());
    }
}
