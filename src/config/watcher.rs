//! Configuration file watcher for hot reload.
//!
//! Only the maintenance flag is applied live; the rest of a reloaded config is
//! ignored until restart. On reload a `maintenance_mode` written in the file
//! beats `MAINTENANCE_MODE` from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{apply_env, ConfigError};
use crate::config::schema::WatcherConfig;
use crate::config::validation::validate_config;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<WatcherConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<WatcherConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "Config file change detected, reloading");
                        match reload(&path, |key| std::env::var(key).ok()) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload config, keeping current settings");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

/// Reload with startup precedence (file, then environment), except for an
/// explicit `detection.maintenance_mode` in the file.
fn reload<F>(path: &Path, lookup: F) -> Result<WatcherConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: WatcherConfig = toml::from_str(&content)?;
    let file_maintenance = content
        .parse::<toml::Table>()?
        .get("detection")
        .and_then(|detection| detection.get("maintenance_mode"))
        .and_then(toml::Value::as_bool);

    apply_env(&mut config, lookup)?;
    if let Some(enabled) = file_maintenance {
        config.detection.maintenance_mode = enabled;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
