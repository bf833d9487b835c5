//! Operator maintenance switch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::WatcherConfig;

/// Shared on/off flag; clones observe the same value.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceSwitch {
    enabled: Arc<AtomicBool>,
}

impl MaintenanceSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Set the flag, logging only real transitions.
    pub fn set(&self, enabled: bool) {
        let previous = self.enabled.swap(enabled, Ordering::Relaxed);
        if previous != enabled {
            if enabled {
                tracing::warn!("Maintenance mode enabled, alerts suppressed");
            } else {
                tracing::info!("Maintenance mode disabled, alerts resumed");
            }
        }
    }

    /// Apply reloaded configurations until the sender goes away.
    pub async fn follow(self, mut updates: mpsc::UnboundedReceiver<WatcherConfig>) {
        while let Some(config) = updates.recv().await {
            self.set(config.detection.maintenance_mode);
        }
        tracing::debug!("Config update channel closed");
    }
}
