//! Maintenance and cooldown gating in front of the sink.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::alert::{AlertCategory, AlertOutcome, AlertSink, LastFired, MaintenanceSwitch};
use crate::config::{AlertConfig, DeliveryMode};
use crate::observability::metrics;

enum Delivery {
    Inline,
    Background { permits: Arc<Semaphore> },
}

/// Decides whether an alert goes out and sends it.
///
/// Holds no per-alert state itself: last-fired instants live in the
/// [`LastFired`] passed by the caller.
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    cooldown: Duration,
    maintenance: MaintenanceSwitch,
    delivery: Delivery,
}

impl AlertDispatcher {
    /// Dispatcher that awaits every delivery.
    pub fn new(sink: Arc<dyn AlertSink>, cooldown: Duration, maintenance: MaintenanceSwitch) -> Self {
        Self {
            sink,
            cooldown,
            maintenance,
            delivery: Delivery::Inline,
        }
    }

    /// Build from the `[alerts]` section.
    pub fn from_config(
        sink: Arc<dyn AlertSink>,
        config: &AlertConfig,
        maintenance: MaintenanceSwitch,
    ) -> Self {
        let dispatcher = Self::new(sink, Duration::from_secs(config.cooldown_secs), maintenance);
        match config.delivery {
            DeliveryMode::Inline => dispatcher,
            DeliveryMode::Background => dispatcher.with_background_delivery(config.max_in_flight),
        }
    }

    /// Spawn deliveries instead of awaiting them, at most `max_in_flight` at once.
    pub fn with_background_delivery(mut self, max_in_flight: usize) -> Self {
        self.delivery = Delivery::Background {
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        };
        self
    }

    pub fn maintenance(&self) -> &MaintenanceSwitch {
        &self.maintenance
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Gate and deliver one alert.
    ///
    /// Order: maintenance, then cooldown (`elapsed <= cooldown` suppresses),
    /// then delivery. `last_fired` is updated before sending and regardless of
    /// the delivery result.
    pub async fn maybe_alert(
        &self,
        last_fired: &mut LastFired,
        category: AlertCategory,
        message: String,
        now: Instant,
    ) -> AlertOutcome {
        let outcome = self.gate_and_send(last_fired, category, message, now).await;
        // Background sends are counted by the spawned task once the result is known.
        if outcome != AlertOutcome::Dispatched {
            metrics::record_alert(category, outcome);
        }
        outcome
    }

    async fn gate_and_send(
        &self,
        last_fired: &mut LastFired,
        category: AlertCategory,
        message: String,
        now: Instant,
    ) -> AlertOutcome {
        if self.maintenance.is_enabled() {
            debug!(%category, "Alert suppressed by maintenance mode");
            return AlertOutcome::SuppressedMaintenance;
        }

        if let Some(last) = last_fired.get(category) {
            let elapsed = now.saturating_duration_since(last);
            if elapsed <= self.cooldown {
                debug!(
                    %category,
                    elapsed_secs = elapsed.as_secs(),
                    cooldown_secs = self.cooldown.as_secs(),
                    "Alert suppressed by cooldown"
                );
                return AlertOutcome::SuppressedCooldown;
            }
        }

        last_fired.set(category, now);
        info!(%category, message = %message, "Sending alert");

        match &self.delivery {
            Delivery::Inline => match self.sink.send(&message).await {
                Ok(()) => AlertOutcome::Delivered,
                Err(e) => {
                    error!(%category, sink = self.sink.name(), error = %e, "Failed to deliver alert");
                    AlertOutcome::DeliveryFailed
                }
            },
            Delivery::Background { permits } => match Arc::clone(permits).try_acquire_owned() {
                Ok(permit) => {
                    let sink = Arc::clone(&self.sink);
                    tokio::spawn(async move {
                        let _permit = permit;
                        match sink.send(&message).await {
                            Ok(()) => metrics::record_alert(category, AlertOutcome::Delivered),
                            Err(e) => {
                                error!(%category, sink = sink.name(), error = %e, "Failed to deliver alert");
                                metrics::record_alert(category, AlertOutcome::DeliveryFailed);
                            }
                        }
                    });
                    AlertOutcome::Dispatched
                }
                Err(_) => {
                    warn!(%category, "Too many alerts in flight, dropping alert");
                    AlertOutcome::DroppedBackpressure
                }
            },
        }
    }
}
