//! The per-line monitor loop.

use std::time::Instant;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::alert::{error_rate_message, failover_message, AlertCategory, AlertDispatcher, AlertOutcome};
use crate::config::{DetectionConfig, MaintenanceScope};
use crate::monitor::state::MonitorState;
use crate::observability::metrics;
use crate::parser::RecordParser;
use crate::source::{LineSource, SourceError};

/// Result of feeding one line through the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line did not match the pattern; nothing changed.
    Unparsed,
    /// Maintenance with scope `all`; nothing changed.
    Skipped,
    /// State updated; an outcome per alert that qualified on this line.
    Processed {
        failover: Option<AlertOutcome>,
        error_rate: Option<AlertOutcome>,
    },
}

/// Counters kept for the shutdown summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub lines: u64,
    pub parse_failures: u64,
    pub skipped: u64,
    pub alerts_attempted: u64,
    pub alerts_suppressed: u64,
}

/// Owns [`MonitorState`] and drives parser, detectors and dispatcher.
pub struct MonitorLoop<P> {
    parser: P,
    dispatcher: AlertDispatcher,
    state: MonitorState,
    threshold: f64,
    scope: MaintenanceScope,
    stats: LoopStats,
}

impl<P: RecordParser> MonitorLoop<P> {
    pub fn new(parser: P, dispatcher: AlertDispatcher, config: &DetectionConfig) -> Self {
        Self {
            parser,
            dispatcher,
            state: MonitorState::new(config.window_size),
            threshold: config.error_rate_threshold,
            scope: config.maintenance_scope,
            stats: LoopStats::default(),
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Consume lines until the source is exhausted or shutdown fires.
    pub async fn run<S>(
        &mut self,
        source: &mut S,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<LoopStats, SourceError>
    where
        S: LineSource + ?Sized,
    {
        info!(
            source = source.description(),
            window_size = self.state.error_rate.window().capacity(),
            threshold = self.threshold,
            cooldown_secs = self.dispatcher.cooldown().as_secs(),
            "Monitor loop started"
        );

        loop {
            let next = tokio::select! {
                line = source.next_line() => line?,
                Ok(()) = shutdown.recv() => {
                    info!("Shutdown signal received, stopping monitor loop");
                    break;
                }
            };

            match next {
                Some(line) => {
                    self.process_line(&line, Instant::now()).await;
                }
                None => {
                    info!(source = source.description(), "Line source exhausted");
                    break;
                }
            }
        }

        let stats = self.stats;
        info!(
            lines = stats.lines,
            parse_failures = stats.parse_failures,
            skipped = stats.skipped,
            alerts_attempted = stats.alerts_attempted,
            alerts_suppressed = stats.alerts_suppressed,
            "Monitor loop stopped"
        );
        Ok(stats)
    }

    /// Parse one line, update state and dispatch whatever qualifies.
    pub async fn process_line(&mut self, line: &str, now: Instant) -> LineOutcome {
        self.stats.lines += 1;
        metrics::record_line();

        let record = match self.parser.parse(line) {
            Ok(record) => record,
            Err(e) => {
                self.stats.parse_failures += 1;
                metrics::record_parse_failure();
                warn!(error = %e, line = %line, "Failed to parse log line");
                return LineOutcome::Unparsed;
            }
        };

        if self.scope == MaintenanceScope::All && self.dispatcher.maintenance().is_enabled() {
            self.stats.skipped += 1;
            debug!("Maintenance mode, line ignored");
            return LineOutcome::Skipped;
        }

        let failover = match self.state.failover.observe(&record.pool) {
            Some(event) => {
                info!(from = %event.from, to = %event.to, "Pool failover observed");
                let message = failover_message(&event, &record);
                Some(self.dispatch(AlertCategory::Failover, message, now).await)
            }
            None => None,
        };

        let mut error_rate = None;
        if self.state.error_rate.observe(record.upstream_status) {
            let monitor = &self.state.error_rate;
            let window_len = monitor.window().len();
            metrics::record_window(window_len, monitor.current_rate());

            if let Some(rate) = monitor.evaluate(self.threshold) {
                let message = error_rate_message(rate, window_len, self.threshold, &record.timestamp);
                error_rate = Some(self.dispatch(AlertCategory::ErrorRate, message, now).await);
            }
        }

        LineOutcome::Processed {
            failover,
            error_rate,
        }
    }

    async fn dispatch(&mut self, category: AlertCategory, message: String, now: Instant) -> AlertOutcome {
        let outcome = self
            .dispatcher
            .maybe_alert(&mut self.state.last_fired, category, message, now)
            .await;
        if outcome.was_attempted() {
            self.stats.alerts_attempted += 1;
        } else {
            self.stats.alerts_suppressed += 1;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertSink, MaintenanceSwitch, SinkError};
    use crate::config::LogFormat;
    use crate::lifecycle::Shutdown;
    use crate::parser::PatternParser;
    use crate::source::VecSource;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, message: &str) -> Result<(), SinkError> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct Harness {
        sink: Arc<RecordingSink>,
        switch: MaintenanceSwitch,
        monitor: MonitorLoop<PatternParser>,
    }

    fn harness(window_size: usize, threshold: f64, scope: MaintenanceScope) -> Harness {
        let sink = Arc::new(RecordingSink::default());
        let switch = MaintenanceSwitch::new(false);
        let dispatcher = AlertDispatcher::new(sink.clone(), Duration::from_secs(300), switch.clone());
        let config = DetectionConfig {
            error_rate_threshold: threshold,
            window_size,
            maintenance_mode: false,
            maintenance_scope: scope,
        };
        let monitor = MonitorLoop::new(PatternParser::for_format(LogFormat::KeyValue), dispatcher, &config);
        Harness {
            sink,
            switch,
            monitor,
        }
    }

    fn line(pool: &str, status: &str) -> String {
        format!("pool={pool} method=GET upstream_status={status}")
    }

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    #[tokio::test]
    async fn test_error_rate_scenario() {
        let mut h = harness(3, 50.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();

        assert_eq!(
            h.monitor.process_line(&line("blue", "200"), t0).await,
            LineOutcome::Processed { failover: None, error_rate: None }
        );
        h.monitor.process_line(&line("blue", "500"), t0).await;
        let third = h.monitor.process_line(&line("blue", "500"), t0).await;

        assert_eq!(
            third,
            LineOutcome::Processed {
                failover: None,
                error_rate: Some(AlertOutcome::Delivered)
            }
        );
        let messages = h.sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("66.67%"));
        assert!(messages[0].contains("threshold 50%"));
    }

    #[tokio::test]
    async fn test_failover_scenario() {
        let mut h = harness(200, 2.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();

        let first = h.monitor.process_line(&line("blue", "200"), t0).await;
        let second = h.monitor.process_line(&line("blue", "200"), t0).await;
        let third = h.monitor.process_line(&line("green", "200"), t0).await;

        assert_eq!(first, LineOutcome::Processed { failover: None, error_rate: None });
        assert_eq!(second, LineOutcome::Processed { failover: None, error_rate: None });
        assert_eq!(
            third,
            LineOutcome::Processed {
                failover: Some(AlertOutcome::Delivered),
                error_rate: None
            }
        );
        assert_eq!(
            h.sink.messages.lock().unwrap().as_slice(),
            ["Failover detected: pool switched from blue to green"]
        );
    }

    #[tokio::test]
    async fn test_repeated_failover_within_cooldown() {
        let mut h = harness(200, 2.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();

        h.monitor.process_line(&line("blue", "200"), at(t0, 0)).await;
        h.monitor.process_line(&line("green", "200"), at(t0, 10)).await;
        let repeat = h.monitor.process_line(&line("blue", "200"), at(t0, 20)).await;

        assert_eq!(
            repeat,
            LineOutcome::Processed {
                failover: Some(AlertOutcome::SuppressedCooldown),
                error_rate: None
            }
        );
        assert_eq!(h.sink.messages.lock().unwrap().len(), 1);
        // The baseline still follows the suppressed change.
        assert_eq!(h.monitor.state().failover.current_pool(), Some("blue"));
    }

    #[tokio::test]
    async fn test_unparsed_line_changes_nothing() {
        let mut h = harness(3, 50.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();
        h.monitor.process_line(&line("blue", "500"), t0).await;

        let before = h.monitor.state().clone();
        let outcome = h.monitor.process_line("this is not a log line", at(t0, 1)).await;

        assert_eq!(outcome, LineOutcome::Unparsed);
        let after = h.monitor.state();
        assert_eq!(after.error_rate.window().len(), before.error_rate.window().len());
        assert_eq!(after.failover.state(), before.failover.state());
        assert_eq!(after.last_fired, before.last_fired);
        assert_eq!(h.monitor.stats().parse_failures, 1);
    }

    #[tokio::test]
    async fn test_sentinel_status_leaves_window() {
        let mut h = harness(3, 50.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();
        h.monitor.process_line(&line("blue", "200"), t0).await;
        h.monitor.process_line(&line("blue", "-"), t0).await;
        assert_eq!(h.monitor.state().error_rate.window().len(), 1);
    }

    #[tokio::test]
    async fn test_no_error_alert_before_window_fills() {
        let mut h = harness(5, 10.0, MaintenanceScope::Alerts);
        let t0 = Instant::now();
        for _ in 0..4 {
            let outcome = h.monitor.process_line(&line("blue", "503"), t0).await;
            assert_eq!(outcome, LineOutcome::Processed { failover: None, error_rate: None });
        }
        assert!(h.sink.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_maintenance_tracks_state_but_stays_silent() {
        let mut h = harness(2, 10.0, MaintenanceScope::Alerts);
        h.switch.set(true);
        let t0 = Instant::now();

        h.monitor.process_line(&line("blue", "500"), t0).await;
        let outcome = h.monitor.process_line(&line("green", "500"), t0).await;

        assert_eq!(
            outcome,
            LineOutcome::Processed {
                failover: Some(AlertOutcome::SuppressedMaintenance),
                error_rate: Some(AlertOutcome::SuppressedMaintenance)
            }
        );
        assert!(h.sink.messages.lock().unwrap().is_empty());
        assert_eq!(h.monitor.state().failover.current_pool(), Some("green"));

        // Leaving maintenance does not replay the change already tracked.
        h.switch.set(false);
        let after = h.monitor.process_line(&line("green", "200"), at(t0, 1)).await;
        assert!(matches!(after, LineOutcome::Processed { failover: None, .. }));
    }

    #[tokio::test]
    async fn test_maintenance_scope_all_freezes_state() {
        let mut h = harness(2, 10.0, MaintenanceScope::All);
        let t0 = Instant::now();
        h.monitor.process_line(&line("blue", "200"), t0).await;

        h.switch.set(true);
        let outcome = h.monitor.process_line(&line("green", "500"), t0).await;
        assert_eq!(outcome, LineOutcome::Skipped);
        assert_eq!(h.monitor.state().failover.current_pool(), Some("blue"));
        assert_eq!(h.monitor.state().error_rate.window().len(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_source() {
        let mut h = harness(2, 10.0, MaintenanceScope::Alerts);
        let shutdown = Shutdown::new();
        let mut source = VecSource::new([
            line("blue", "200"),
            "junk".to_string(),
            line("green", "502"),
        ]);

        let stats = h.monitor.run(&mut source, shutdown.subscribe()).await.unwrap();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.parse_failures, 1);
        assert_eq!(stats.alerts_attempted, 2);
        assert_eq!(h.sink.messages.lock().unwrap().len(), 2);
    }
}
