//! Regex-backed record parser.

use regex::Regex;

use crate::config::{LogFormat, SourceConfig};
use crate::parser::{ParseError, Record, RecordParser, UpstreamStatus};

/// nginx `log_format` with pool/release/upstream fields appended.
pub const ACCESS_PATTERN: &str = concat!(
    r#"^(?P<remote_addr>.*?) - (?P<remote_user>.*?) \[(?P<time_local>.*?)\] "#,
    r#""(?P<request>.*?)" (?P<status>\d+) (?P<body_bytes_sent>\d+) "#,
    r#""(?P<http_referer>.*?)" "(?P<http_user_agent>.*?)" "#,
    r#"pool:"(?P<pool>.*?)" release:"(?P<release>.*?)" "#,
    r#"upstream_status:(?P<upstream_status>\d+|-) upstream_addr:(?P<upstream_addr>.*?) "#,
    r#"request_time:(?P<request_time>.*?) upstream_response_time:(?P<upstream_response_time>.*?)"#,
);

/// Loose `pool=… upstream_status=…` pairs, matched anywhere in the line.
pub const KEY_VALUE_PATTERN: &str = r"pool=(?P<pool>\w+).*upstream_status=(?P<upstream_status>\d+|-)";

const REQUIRED_GROUPS: [&str; 2] = ["pool", "upstream_status"];

/// Parses lines with a regex exposing named capture groups.
///
/// `pool` and `upstream_status` are required; `time_local`, `release` and
/// `upstream_addr` are picked up when present.
#[derive(Debug, Clone)]
pub struct PatternParser {
    regex: Regex,
}

impl PatternParser {
    /// Compile a custom pattern.
    pub fn new(pattern: &str) -> Result<Self, ParseError> {
        let regex = Regex::new(pattern).map_err(|e| ParseError::InvalidPattern(e.to_string()))?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        for group in REQUIRED_GROUPS {
            if !names.contains(&group) {
                return Err(ParseError::InvalidPattern(format!(
                    "missing named group `{group}`"
                )));
            }
        }

        Ok(Self { regex })
    }

    /// Parser for a built-in format.
    pub fn for_format(format: LogFormat) -> Self {
        let pattern = match format {
            LogFormat::Access => ACCESS_PATTERN,
            LogFormat::KeyValue => KEY_VALUE_PATTERN,
        };
        // Built-in patterns are covered by tests.
        Self::new(pattern).expect("built-in pattern compiles")
    }

    /// Custom pattern if configured, otherwise the configured format.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ParseError> {
        match config.pattern.as_deref() {
            Some(pattern) => Self::new(pattern),
            None => Ok(Self::for_format(config.format)),
        }
    }

    /// The underlying expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl RecordParser for PatternParser {
    fn parse(&self, line: &str) -> Result<Record, ParseError> {
        let caps = self.regex.captures(line).ok_or(ParseError::NoMatch)?;

        let text = |name: &str| caps.name(name).map(|m| m.as_str());
        let non_empty = |name: &str| text(name).filter(|s| !s.is_empty()).map(str::to_string);

        Ok(Record {
            pool: text("pool").unwrap_or_default().to_string(),
            upstream_status: text("upstream_status").and_then(UpstreamStatus::from_token),
            timestamp: text("time_local").unwrap_or_default().to_string(),
            release: non_empty("release"),
            upstream_addr: non_empty("upstream_addr"),
        })
    }
}
