//! Polling tail of a growing file.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;

use super::{strip_newline, LineSource, SourceError};

/// Longest line kept; anything longer is dropped whole.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Follows a log file from its end, like `tail -F` without rotation support.
///
/// A fragment without a trailing newline is held back until the writer
/// finishes the line. Lines over [`MAX_LINE_BYTES`] are skipped.
#[derive(Debug)]
pub struct LogTail {
    path: PathBuf,
    reader: BufReader<File>,
    /// Bytes consumed from the start of the file.
    position: u64,
    pending: Vec<u8>,
    /// Inside an overlong line; drop bytes up to the next newline.
    discarding: bool,
    poll_interval: Duration,
    description: String,
}

impl LogTail {
    /// Open `path` and position the cursor at its current end.
    pub async fn open<P: AsRef<Path>>(path: P, poll_interval: Duration) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| SourceError::Open {
            path: path.clone(),
            source,
        };

        let mut file = File::open(&path).await.map_err(open_err)?;
        let position = file.seek(SeekFrom::End(0)).await.map_err(open_err)?;

        tracing::info!(path = %path.display(), offset = position, "Tailing log file");

        let description = format!("tail: {}", path.display());
        Ok(Self {
            path,
            reader: BufReader::new(file),
            position,
            pending: Vec::new(),
            discarding: false,
            poll_interval,
            description,
        })
    }

    /// Returns the path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current read offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    async fn check_truncation(&mut self) -> Result<(), SourceError> {
        let len = self.reader.get_ref().metadata().await?.len();
        if len < self.position {
            tracing::warn!(
                path = %self.path.display(),
                previous_offset = self.position,
                new_len = len,
                "Log file shrank, seeking to new end"
            );
            self.pending.clear();
            self.discarding = false;
            self.position = self.reader.seek(SeekFrom::End(0)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LineSource for LogTail {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            // read_until appends to `pending`, so a cancelled call loses nothing.
            let limit = (MAX_LINE_BYTES - self.pending.len()) as u64;
            let read = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.pending)
                .await?;
            if read == 0 {
                self.check_truncation().await?;
                sleep(self.poll_interval).await;
                continue;
            }
            self.position += read as u64;

            if self.pending.last() == Some(&b'\n') {
                let bytes = std::mem::take(&mut self.pending);
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                let line = String::from_utf8_lossy(&bytes).into_owned();
                return Ok(Some(strip_newline(line)));
            }

            if self.pending.len() >= MAX_LINE_BYTES {
                if !self.discarding {
                    tracing::warn!(
                        path = %self.path.display(),
                        max_bytes = MAX_LINE_BYTES,
                        "Line exceeds maximum length, dropping it"
                    );
                    self.discarding = true;
                }
                self.pending.clear();
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}
