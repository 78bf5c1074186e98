//! Configuration file parsing and management.
//!
//! Settings come from TOML files and `RDAP_*` environment variables. Files
//! are discovered in XDG, home and current directory locations and merged
//! with later (more local) files winning.

use crate::error::RdapLookupError;
use crate::types::LookupConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest request deadline accepted from files, environment or flags.
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    /// Request deadline (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Max lookups in flight for batch runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Path to an IANA `dns.json` snapshot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Human-readable output instead of JSON
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,

    /// Include the raw RDAP object in output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
}

impl FileConfig {
    /// Apply file defaults on top of a `LookupConfig`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(defaults) = &self.defaults {
            if let Some(secs) = defaults.timeout.as_deref().and_then(parse_bounded_timeout) {
                config = config.with_timeout(Duration::from_secs(secs));
            }
            if let Some(concurrency) = defaults.concurrency {
                config = config.with_concurrency(concurrency);
            }
            if let Some(user_agent) = &defaults.user_agent {
                config = config.with_user_agent(user_agent.clone());
            }
        }
        config
    }

    pub fn bootstrap_file(&self) -> Option<&Path> {
        self.defaults.as_ref()?.bootstrap_file.as_deref()
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to emit warnings for config issues
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, RdapLookupError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RdapLookupError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            RdapLookupError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;
        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    pub fn discover_and_load(&self) -> Result<FileConfig, RdapLookupError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                }
            }
        }

        if self.verbose && loaded_files.len() > 1 {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "merged config file");
            }
        }

        Ok(merged_config)
    }

    /// Looks for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./rdap-lookup.toml", "./.rdap-lookup.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Looks for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".rdap-lookup.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("rdap-lookup").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Values from `higher` take precedence over values from `lower`.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.timeout.is_some() {
                        lower_defaults.timeout = higher_defaults.timeout;
                    }
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.bootstrap_file.is_some() {
                        lower_defaults.bootstrap_file = higher_defaults.bootstrap_file;
                    }
                    if higher_defaults.user_agent.is_some() {
                        lower_defaults.user_agent = higher_defaults.user_agent;
                    }
                    if higher_defaults.pretty.is_some() {
                        lower_defaults.pretty = higher_defaults.pretty;
                    }
                    if higher_defaults.raw.is_some() {
                        lower_defaults.raw = higher_defaults.raw;
                    }
                    Some(lower_defaults)
                }
                (None, Some(higher_defaults)) => Some(higher_defaults),
                (Some(lower_defaults), None) => Some(lower_defaults),
                (None, None) => None,
            },
        }
    }

    fn validate_config(&self, config: &FileConfig) -> Result<(), RdapLookupError> {
        let Some(defaults) = &config.defaults else {
            return Ok(());
        };

        if let Some(concurrency) = defaults.concurrency {
            if concurrency == 0 || concurrency > 100 {
                return Err(RdapLookupError::config(
                    "Concurrency must be between 1 and 100",
                ));
            }
        }

        if let Some(timeout_str) = &defaults.timeout {
            if parse_bounded_timeout(timeout_str).is_none() {
                return Err(RdapLookupError::config(format!(
                    "Invalid timeout '{}'. Use format like '5s', '30s', '2m' (at most {}s)",
                    timeout_str, MAX_TIMEOUT_SECS
                )));
            }
        }

        if let Some(user_agent) = &defaults.user_agent {
            if user_agent.trim().is_empty() {
                return Err(RdapLookupError::config("user_agent cannot be empty"));
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub timeout: Option<String>,
    pub concurrency: Option<usize>,
    pub bootstrap_file: Option<PathBuf>,
    pub user_agent: Option<String>,
    pub pretty: Option<bool>,
}

impl EnvConfig {
    /// Apply environment values on top of a `LookupConfig`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(secs) = self.timeout.as_deref().and_then(parse_bounded_timeout) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }
}

/// Load configuration from `RDAP_*` environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    EnvConfig::from_lookup(|key| env::var(key).ok())
}

impl EnvConfig {
    fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let mut env_config = EnvConfig::default();

        if let Some(val) = get("RDAP_TIMEOUT") {
            match parse_bounded_timeout(&val) {
                Some(_) => env_config.timeout = Some(val),
                None => tracing::warn!(value = %val, "invalid RDAP_TIMEOUT, ignoring"),
            }
        }

        if let Some(val) = get("RDAP_CONCURRENCY") {
            match val.parse::<usize>() {
                Ok(n) if (1..=100).contains(&n) => env_config.concurrency = Some(n),
                _ => tracing::warn!(value = %val, "invalid RDAP_CONCURRENCY (1-100), ignoring"),
            }
        }

        if let Some(val) = get("RDAP_BOOTSTRAP_FILE") {
            if !val.trim().is_empty() {
                env_config.bootstrap_file = Some(PathBuf::from(val));
            }
        }

        if let Some(val) = get("RDAP_USER_AGENT") {
            if !val.trim().is_empty() {
                env_config.user_agent = Some(val);
            }
        }

        if let Some(val) = get("RDAP_PRETTY") {
            match parse_bool(&val) {
                Some(b) => env_config.pretty = Some(b),
                None => tracing::warn!(value = %val, "invalid RDAP_PRETTY, ignoring"),
            }
        }

        env_config
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok()?.checked_mul(60)
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    }
}

/// Parse a timeout and accept it only within `1..=MAX_TIMEOUT_SECS` seconds.
pub fn parse_bounded_timeout(timeout_str: &str) -> Option<u64> {
    parse_timeout_string(timeout_str).filter(|secs| (1..=MAX_TIMEOUT_SECS).contains(secs))
}
