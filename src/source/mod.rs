//! Line sources.
//!
//! # Data Flow
//! ```text
//! access.log (append-only, written by the proxy)
//!     → tail.rs (seek to end, read new lines, sleep at EOF)
//!     → MonitorLoop, one line at a time
//!
//! --replay:
//!     memory.rs (whole file read once, exhausted at the end)
//! ```
//!
//! # Design Decisions
//! - Opening the file is the only fatal failure
//! - End of file is a wait state, not an error
//! - Truncation is detected by size and answered by seeking to the new end

pub mod memory;
pub mod tail;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::VecSource;
pub use tail::LogTail;

/// Errors raised by a line source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}

/// A stream of log lines, newline already stripped.
#[async_trait]
pub trait LineSource: Send {
    /// Next line, waiting for one if necessary. `Ok(None)` means the source
    /// is exhausted and will never yield again.
    async fn next_line(&mut self) -> Result<Option<String>, SourceError>;

    /// Human-readable description for logs.
    fn description(&self) -> &str;
}

/// Remove one trailing `\n` or `\r\n`.
pub(crate) fn strip_newline(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}
