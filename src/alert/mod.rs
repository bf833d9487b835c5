//! Alert dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! MonitorLoop (category, message, now)
//!     → dispatcher.rs: maintenance switch?   → SuppressedMaintenance
//!     → dispatcher.rs: within cooldown?      → SuppressedCooldown
//!     → record last-fired, then sink.rs      → Delivered / DeliveryFailed
//!                                              (or Dispatched in background mode)
//! ```
//!
//! # Design Decisions
//! - One cooldown clock per category, no queueing of suppressed alerts
//! - The clock advances on attempt, not on confirmed receipt
//! - Sink failures are logged and swallowed

pub mod dispatcher;
pub mod maintenance;
pub mod sink;

use std::fmt;
use std::time::Instant;

pub use dispatcher::AlertDispatcher;
pub use maintenance::MaintenanceSwitch;
pub use sink::{AlertSink, SinkError, WebhookSink};

use crate::monitor::failover::Failover;
use crate::parser::Record;

/// Independent alert kinds, each with its own cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    Failover,
    ErrorRate,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Failover => "failover",
            AlertCategory::ErrorRate => "error_rate",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    Delivered,
    DeliveryFailed,
    /// Handed to a background task.
    Dispatched,
    /// Background slots exhausted; the attempt still counts for cooldown.
    DroppedBackpressure,
    SuppressedMaintenance,
    SuppressedCooldown,
}

impl AlertOutcome {
    /// True when the cooldown clock was advanced.
    pub fn was_attempted(&self) -> bool {
        !matches!(
            self,
            AlertOutcome::SuppressedMaintenance | AlertOutcome::SuppressedCooldown
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertOutcome::Delivered => "delivered",
            AlertOutcome::DeliveryFailed => "failed",
            AlertOutcome::Dispatched => "dispatched",
            AlertOutcome::DroppedBackpressure => "dropped",
            AlertOutcome::SuppressedMaintenance => "maintenance",
            AlertOutcome::SuppressedCooldown => "cooldown",
        }
    }
}

/// Last-fired instant per category; `None` means never fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastFired {
    failover: Option<Instant>,
    error_rate: Option<Instant>,
}

impl LastFired {
    pub fn get(&self, category: AlertCategory) -> Option<Instant> {
        match category {
            AlertCategory::Failover => self.failover,
            AlertCategory::ErrorRate => self.error_rate,
        }
    }

    pub fn set(&mut self, category: AlertCategory, at: Instant) {
        match category {
            AlertCategory::Failover => self.failover = Some(at),
            AlertCategory::ErrorRate => self.error_rate = Some(at),
        }
    }
}

/// Text of a failover alert.
pub fn failover_message(failover: &Failover, record: &Record) -> String {
    let mut message = format!(
        "Failover detected: pool switched from {} to {}",
        display_pool(&failover.from),
        display_pool(&failover.to)
    );
    if let Some(release) = &record.release {
        message.push_str(&format!(" (release {release})"));
    }
    if !record.timestamp.is_empty() {
        message.push_str(&format!(" at {}", record.timestamp));
    }
    message
}

/// Text of an error-rate alert.
pub fn error_rate_message(rate: f64, window_len: usize, threshold: f64, timestamp: &str) -> String {
    let mut message = format!(
        "High error rate: {rate:.2}% 5xx over last {window_len} requests (threshold {threshold}%)"
    );
    if !timestamp.is_empty() {
        message.push_str(&format!(" at {timestamp}"));
    }
    message
}

fn display_pool(pool: &str) -> &str {
    if pool.is_empty() {
        "<unknown>"
    } else {
        pool
    }
}
