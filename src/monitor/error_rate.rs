//! Rolling 5xx rate over the last N upstream statuses.

use std::collections::VecDeque;

use crate::parser::UpstreamStatus;

/// Fixed-capacity FIFO of upstream statuses.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    entries: VecDeque<UpstreamStatus>,
    capacity: usize,
}

impl SlidingWindow {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting the oldest entry when full.
    pub fn push(&mut self, status: UpstreamStatus) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(status);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries classified as 5xx.
    pub fn server_errors(&self) -> usize {
        self.entries.iter().filter(|s| s.is_server_error()).count()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &UpstreamStatus> {
        self.entries.iter()
    }
}

/// Tracks the window and whether it has ever been full.
#[derive(Debug, Clone)]
pub struct ErrorRateMonitor {
    window: SlidingWindow,
    warm: bool,
}

impl ErrorRateMonitor {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: SlidingWindow::new(window_size),
            warm: false,
        }
    }

    /// Record one line's status. Absent statuses are ignored.
    ///
    /// Returns true when the window changed.
    pub fn observe(&mut self, status: Option<UpstreamStatus>) -> bool {
        let Some(status) = status else {
            return false;
        };
        self.window.push(status);
        if self.window.is_full() {
            self.warm = true;
        }
        true
    }

    /// `100 * 5xx / len`, or `None` for an empty window.
    pub fn current_rate(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        Some(100.0 * self.window.server_errors() as f64 / self.window.len() as f64)
    }

    /// True once the window has reached capacity. Never resets.
    pub fn is_warm(&self) -> bool {
        self.warm
    }

    /// Rate when warm and strictly above `threshold`.
    pub fn evaluate(&self, threshold: f64) -> Option<f64> {
        if !self.warm {
            return None;
        }
        self.current_rate().filter(|rate| *rate > threshold)
    }

    pub fn window(&self) -> &SlidingWindow {
        &self.window
    }
}
