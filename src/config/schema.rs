//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the watcher.
//! All types derive Serde traits so the same shape can be read from an
//! optional TOML file before environment overrides are applied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the log watcher.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WatcherConfig {
    /// Where log lines come from and how they are shaped.
    pub source: SourceConfig,

    /// Error-rate window and maintenance settings.
    pub detection: DetectionConfig,

    /// Alert delivery settings.
    pub alerts: AlertConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Reload the config file on change (maintenance toggle without restart).
    pub watch_config: bool,
}

impl WatcherConfig {
    /// Copy of the configuration safe to print (webhook URL hidden).
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.alerts.webhook_url.is_some() {
            copy.alerts.webhook_url = Some("<redacted>".to_string());
        }
        copy
    }
}

/// Log source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Path of the access log to tail.
    pub log_file: String,

    /// Sleep between reads when the tail is at end of file.
    pub poll_interval_ms: u64,

    /// Built-in line pattern.
    pub format: LogFormat,

    /// Custom regex overriding `format`. Must define `pool` and
    /// `upstream_status` named groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            log_file: "/var/log/nginx/access.log".to_string(),
            poll_interval_ms: 100,
            format: LogFormat::Access,
            pattern: None,
        }
    }
}

/// Detection thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Percentage of 5xx upstream statuses that triggers an alert (strictly above).
    pub error_rate_threshold: f64,

    /// Number of upstream statuses kept in the sliding window.
    pub window_size: usize,

    /// Suppress all alert dispatch.
    pub maintenance_mode: bool,

    /// What maintenance mode suppresses.
    pub maintenance_scope: MaintenanceScope,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: 2.0,
            window_size: 200,
            maintenance_mode: false,
            maintenance_scope: MaintenanceScope::Alerts,
        }
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Slack-compatible incoming webhook. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Minimum seconds between two delivered alerts of the same category.
    pub cooldown_secs: u64,

    /// HTTP timeout for a single webhook call.
    pub timeout_secs: u64,

    /// Whether the monitor loop waits for delivery.
    pub delivery: DeliveryMode,

    /// Concurrent background deliveries before alerts are dropped.
    pub max_in_flight: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            cooldown_secs: 300,
            timeout_secs: 5,
            delivery: DeliveryMode::Inline,
            max_in_flight: 4,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Prometheus exporter bind address; exporter disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

/// Built-in log line shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// nginx access log with `pool:"…" release:"…" upstream_status:…` suffix.
    Access,
    /// Loose `pool=… upstream_status=…` pairs anywhere in the line.
    KeyValue,
}

/// What maintenance mode suppresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceScope {
    /// Keep tracking pools and the error window, suppress only dispatch.
    Alerts,
    /// Ignore lines entirely while maintenance is on.
    All,
}

/// How alerts reach the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Await each webhook call on the monitor loop.
    Inline,
    /// Spawn webhook calls, bounded by `max_in_flight`.
    Background,
}

/// Error for an unrecognised enum value in the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    expected: &'static str,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected one of {}", self.expected)
    }
}

impl FromStr for LogFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "access" => Ok(LogFormat::Access),
            "keyvalue" | "key_value" | "kv" => Ok(LogFormat::KeyValue),
            _ => Err(UnknownVariant { expected: "access, keyvalue" }),
        }
    }
}

impl FromStr for MaintenanceScope {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alerts" => Ok(MaintenanceScope::Alerts),
            "all" => Ok(MaintenanceScope::All),
            _ => Err(UnknownVariant { expected: "alerts, all" }),
        }
    }
}

impl FromStr for DeliveryMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(DeliveryMode::Inline),
            "background" => Ok(DeliveryMode::Background),
            _ => Err(UnknownVariant { expected: "inline, background" }),
        }
    }
}
