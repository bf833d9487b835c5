//! Metrics collection and exposition.
//!
//! # Metrics
//! - `watcher_lines_total` (counter): lines read from the log
//! - `watcher_parse_failures_total` (counter): lines not matching the pattern
//! - `watcher_alerts_total` (counter): alerts by category and outcome
//! - `watcher_window_len` (gauge): entries in the error-rate window
//! - `watcher_error_rate_percent` (gauge): current 5xx share of the window
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::alert::{AlertCategory, AlertOutcome};

/// Serve Prometheus metrics on `addr`. Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_line() {
    counter!("watcher_lines_total").increment(1);
}

pub fn record_parse_failure() {
    counter!("watcher_parse_failures_total").increment(1);
}

pub fn record_alert(category: AlertCategory, outcome: AlertOutcome) {
    counter!(
        "watcher_alerts_total",
        "category" => category.as_str(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn record_window(len: usize, rate: Option<f64>) {
    gauge!("watcher_window_len").set(len as f64);
    if let Some(rate) = rate {
        gauge!("watcher_error_rate_percent").set(rate);
    }
}
