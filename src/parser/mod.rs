//! Log line parsing.
//!
//! # Data Flow
//! ```text
//! raw line (String)
//!     → RecordParser::parse
//!     → Ok(Record { pool, upstream_status, timestamp, .. })
//!     → Err(ParseError::NoMatch)  (caller logs and skips)
//! ```
//!
//! # Design Decisions
//! - One trait, one regex-backed implementation; the concrete pattern is config
//! - The `-` sentinel becomes `None`, never an error
//! - A non-numeric status token is kept as `Malformed` and never counts as 5xx

pub mod pattern;

use thiserror::Error;

pub use pattern::PatternParser;

/// One parsed access-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Active backend pool as logged. May be empty.
    pub pool: String,
    /// `None` when no upstream was attempted (`-`).
    pub upstream_status: Option<UpstreamStatus>,
    /// Timestamp exactly as logged, empty when the pattern has none.
    pub timestamp: String,
    /// Release tag of the serving pool, if the format carries it.
    pub release: Option<String>,
    /// Upstream address, if the format carries it.
    pub upstream_addr: Option<String>,
}

/// An upstream status token that was present on the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamStatus {
    Code(u16),
    Malformed(String),
}

impl UpstreamStatus {
    /// Classify a raw token. Returns `None` for the sentinel or an empty token.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() || token == "-" {
            return None;
        }
        Some(match token.parse::<u16>() {
            Ok(code) => UpstreamStatus::Code(code),
            Err(_) => UpstreamStatus::Malformed(token.to_string()),
        })
    }

    /// True for integer codes in `[500, 600)`.
    pub fn is_server_error(&self) -> bool {
        matches!(self, UpstreamStatus::Code(code) if (500..600).contains(code))
    }
}

/// Parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line does not match the configured pattern")]
    NoMatch,

    #[error("invalid log pattern: {0}")]
    InvalidPattern(String),
}

/// Turns a raw line into a [`Record`].
pub trait RecordParser: Send + Sync {
    fn parse(&self, line: &str) -> Result<Record, ParseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_absent() {
        assert_eq!(UpstreamStatus::from_token("-"), None);
        assert_eq!(UpstreamStatus::from_token(""), None);
    }

    #[test]
    fn test_numeric_and_malformed_tokens() {
        assert_eq!(UpstreamStatus::from_token("502"), Some(UpstreamStatus::Code(502)));
        let malformed = UpstreamStatus::from_token("502, 200").unwrap();
        assert_eq!(malformed, UpstreamStatus::Malformed("502, 200".into()));
        assert!(!malformed.is_server_error());
    }

    #[test]
    fn test_server_error_bounds() {
        assert!(!UpstreamStatus::Code(499).is_server_error());
        assert!(UpstreamStatus::Code(500).is_server_error());
        assert!(UpstreamStatus::Code(599).is_server_error());
        assert!(!UpstreamStatus::Code(600).is_server_error());
    }
}
