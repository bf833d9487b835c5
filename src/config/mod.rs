//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file
//!     → loader.rs (deserialize into WatcherConfig)
//!     → loader.rs (overlay SLACK_WEBHOOK_URL, WINDOW_SIZE, ... from env)
//!     → validation.rs (semantic checks, all errors reported)
//!     → WatcherConfig (validated, immutable)
//!
//! With watch_config = true:
//!     watcher.rs detects change
//!     → reload file + env, validate
//!     → new WatcherConfig sent to the maintenance switch
//! ```
//!
//! # Design Decisions
//! - Environment beats file, file beats defaults
//! - All fields have defaults except the webhook URL
//! - A missing or malformed required value is fatal at startup

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{
    AlertConfig, DeliveryMode, DetectionConfig, LogFormat, MaintenanceScope, ObservabilityConfig,
    SourceConfig, WatcherConfig,
};
pub use validation::ValidationError;
