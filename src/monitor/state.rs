//! Mutable state owned by the monitor loop.

use crate::alert::LastFired;
use crate::monitor::error_rate::ErrorRateMonitor;
use crate::monitor::failover::FailoverDetector;

/// Everything the loop mutates per record. Created once, never persisted.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub error_rate: ErrorRateMonitor,
    pub failover: FailoverDetector,
    pub last_fired: LastFired,
}

impl MonitorState {
    pub fn new(window_size: usize) -> Self {
        Self {
            error_rate: ErrorRateMonitor::new(window_size),
            failover: FailoverDetector::new(),
            last_fired: LastFired::default(),
        }
    }
}
