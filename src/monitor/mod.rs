//! Stream monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! LineSource ──line──▶ runner.rs (MonitorLoop)
//!                          │ RecordParser::parse
//!                          ├──pool──────▶ failover.rs   (Unset / Tracking)
//!                          ├──status────▶ error_rate.rs (SlidingWindow, warm-up latch)
//!                          └──alerts────▶ AlertDispatcher
//! ```
//!
//! # Design Decisions
//! - MonitorState is owned by the loop; nothing else holds a mutable reference
//! - The error rate is only evaluated once the window has filled at least once
//! - Maintenance handling is decided by MaintenanceScope

pub mod error_rate;
pub mod failover;
pub mod runner;
pub mod state;

pub use error_rate::{ErrorRateMonitor, SlidingWindow};
pub use failover::{Failover, FailoverDetector, PoolState};
pub use runner::{LineOutcome, LoopStats, MonitorLoop};
pub use state::MonitorState;
