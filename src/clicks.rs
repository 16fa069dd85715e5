//! Click aggregation: turns single button presses into bursts.
//!
//! A burst is a run of presses where each one follows the previous by less
//! than the idle window. Every press pushes the deadline back; once a poll
//! sees the deadline pass with no further press, the burst is complete and
//! its count is handed out exactly once.
//!
//! The aggregator is a plain value polled from the render loop, so there is
//! no timer thread to race with: a press and a deadline check can never
//! interleave.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ClickAggregator {
    window: Duration,
    count: u32,
    deadline: Option<Instant>,
}

impl ClickAggregator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            count: 0,
            deadline: None,
        }
    }

    /// Record a debounced press that happened at `at`.
    pub fn on_press(&mut self, at: Instant) {
        self.count = self.count.saturating_add(1);
        self.deadline = Some(at + self.window);
        tracing::info!("Click {}", self.count);
    }

    /// Check the idle deadline.
    ///
    /// Returns the burst size once, on the first poll at or after the
    /// deadline. A burst with no presses never completes.
    pub fn poll(&mut self, now: Instant) -> Option<u32> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        self.deadline = None;
        let count = std::mem::take(&mut self.count);
        (count > 0).then(|| {
            tracing::info!("Click burst complete: {} clicks", count);
            count
        })
    }

    /// Drop the pending burst without reporting it.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            tracing::debug!("Discarding pending burst of {} clicks", self.count);
        }
        self.count = 0;
    }

    /// Presses counted in the current burst so far.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
