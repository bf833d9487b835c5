//! Configuration loading from disk and environment.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::WatcherConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML configuration file without validating it.
pub fn load_config(path: &Path) -> Result<WatcherConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load the effective configuration: optional file, then process environment,
/// then validation.
pub fn load(path: Option<&Path>) -> Result<WatcherConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load`] with an injectable environment lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<WatcherConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => WatcherConfig::default(),
    };
    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// Unset and empty variables leave the current value alone.
pub fn apply_env<F>(config: &mut WatcherConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get("SLACK_WEBHOOK_URL") {
        config.alerts.webhook_url = Some(url.trim().to_string());
    }
    if let Some(path) = get("LOG_FILE") {
        config.source.log_file = path;
    }
    if let Some(pattern) = get("LOG_PATTERN") {
        config.source.pattern = Some(pattern);
    }
    if let Some(level) = get("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(addr) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }
    if let Some(flag) = get("MAINTENANCE_MODE") {
        config.detection.maintenance_mode = parse_flag(&flag);
    }

    parse_into(&get, "ERROR_RATE_THRESHOLD", &mut config.detection.error_rate_threshold)?;
    parse_into(&get, "WINDOW_SIZE", &mut config.detection.window_size)?;
    parse_into(&get, "MAINTENANCE_SCOPE", &mut config.detection.maintenance_scope)?;
    parse_into(&get, "ALERT_COOLDOWN_SEC", &mut config.alerts.cooldown_secs)?;
    parse_into(&get, "ALERT_TIMEOUT_SECS", &mut config.alerts.timeout_secs)?;
    parse_into(&get, "ALERT_DELIVERY", &mut config.alerts.delivery)?;
    parse_into(&get, "ALERT_MAX_IN_FLIGHT", &mut config.alerts.max_in_flight)?;
    parse_into(&get, "POLL_INTERVAL_MS", &mut config.source.poll_interval_ms)?;
    parse_into(&get, "LOG_FORMAT", &mut config.source.format)?;

    Ok(())
}

fn parse_into<G, T>(get: &G, key: &'static str, target: &mut T) -> Result<(), ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = get(key) {
        *target = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

/// Anything other than true/1/yes/on counts as off.
fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
