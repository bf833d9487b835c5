//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → parser → sink → dispatcher → MonitorLoop → open log
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → monitor loop finishes current line → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
