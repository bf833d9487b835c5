//! In-memory line source for replays and tests.

use std::collections::VecDeque;
use std::path::Path;

use async_trait::async_trait;

use super::{LineSource, SourceError};

/// Yields a fixed list of lines, then reports exhaustion.
#[derive(Debug, Default)]
pub struct VecSource {
    lines: VecDeque<String>,
    description: String,
}

impl VecSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            description: "memory".to_string(),
        }
    }

    /// Read a whole file from the beginning (used by `--replay`).
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);

        let mut source = Self::new(text.lines());
        source.description = format!("replay: {}", path.display());
        Ok(source)
    }

    /// Lines not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for VecSource {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        Ok(self.lines.pop_front())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
