//! Startup orchestration.
//!
//! # Responsibilities
//! - Build parser, sink, dispatcher and monitor loop from a validated config
//! - Open the line source
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The log file is opened last, after everything else is known to work

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::alert::{AlertDispatcher, AlertSink, MaintenanceSwitch, SinkError, WebhookSink};
use crate::config::WatcherConfig;
use crate::monitor::MonitorLoop;
use crate::parser::{ParseError, PatternParser};
use crate::source::{LineSource, LogTail, SourceError, VecSource};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Pattern(#[from] ParseError),

    #[error("cannot build webhook client: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A monitor loop ready to run plus the switch controlling it.
pub struct Watcher {
    pub monitor: MonitorLoop<PatternParser>,
    pub maintenance: MaintenanceSwitch,
}

/// Assemble the watcher with the configured webhook sink.
pub fn build(config: &WatcherConfig) -> Result<Watcher, StartupError> {
    let url = config.alerts.webhook_url.clone().unwrap_or_default();
    let sink = WebhookSink::new(url, Duration::from_secs(config.alerts.timeout_secs))?;
    build_with_sink(config, Arc::new(sink))
}

/// Assemble the watcher around an arbitrary sink.
pub fn build_with_sink(config: &WatcherConfig, sink: Arc<dyn AlertSink>) -> Result<Watcher, StartupError> {
    let parser = PatternParser::from_config(&config.source)?;
    tracing::debug!(pattern = parser.as_str(), "Log pattern compiled");

    let maintenance = MaintenanceSwitch::new(config.detection.maintenance_mode);
    if maintenance.is_enabled() {
        tracing::warn!("Starting in maintenance mode, alerts suppressed");
    }

    let dispatcher = AlertDispatcher::from_config(sink, &config.alerts, maintenance.clone());
    let monitor = MonitorLoop::new(parser, dispatcher, &config.detection);

    Ok(Watcher {
        monitor,
        maintenance,
    })
}

/// Open the log: a tail in normal operation, a one-shot read for replays.
pub async fn open_source(config: &WatcherConfig, replay: bool) -> Result<Box<dyn LineSource>, StartupError> {
    let path = &config.source.log_file;
    let source: Box<dyn LineSource> = if replay {
        Box::new(VecSource::from_file(path).await?)
    } else {
        let poll = Duration::from_millis(config.source.poll_interval_ms);
        Box::new(LogTail::open(path, poll).await?)
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WatcherConfig {
        let mut config = WatcherConfig::default();
        config.alerts.webhook_url = Some("http://127.0.0.1:9/hook".into());
        config
    }

    #[test]
    fn test_build_starts_in_configured_maintenance() {
        let mut config = config();
        config.detection.maintenance_mode = true;
        let watcher = build(&config).unwrap();
        assert!(watcher.maintenance.is_enabled());
    }

    #[test]
    fn test_bad_custom_pattern_is_fatal() {
        let mut config = config();
        config.source.pattern = Some("no groups here".into());
        assert!(matches!(build(&config), Err(StartupError::Pattern(_))));
    }

    #[tokio::test]
    async fn test_missing_log_is_fatal() {
        let mut config = config();
        config.source.log_file = "/nonexistent/access.log".into();
        let err = open_source(&config, false).await.err().unwrap();
        assert!(matches!(err, StartupError::Source(SourceError::Open { .. })));
    }
}
