//! Access-log watcher: pool failover and 5xx rate alerts.

pub mod alert;
pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod parser;
pub mod source;

pub use config::WatcherConfig;
pub use lifecycle::Shutdown;
pub use monitor::MonitorLoop;
