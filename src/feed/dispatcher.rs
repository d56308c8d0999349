use super::accumulator::BatchAccumulator;
use crate::event::{Cursor, RunEvent};
use std::time::Duration;
use tokio::time::Instant;

/// Everything one commit carries into the reducer
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAppend {
    pub events: Vec<RunEvent>,
    pub has_more: bool,
    pub cursor: Cursor,
}

/// Trailing-edge throttle between pushed batches and the reducer.
///
/// The first `signal` arms a deadline one window ahead; later signals only
/// overwrite the pending `(has_more, cursor)`. When the deadline passes,
/// `fire` drains the accumulator together with the latest signal and the
/// dispatcher goes idle until the next `signal`.
///
/// Timing is explicit: callers pass `now` and sleep until `deadline()`.
#[derive(Debug)]
pub struct ThrottledDispatcher {
    window: Duration,
    pending: Option<(bool, Cursor)>,
    deadline: Option<Instant>,
}

impl ThrottledDispatcher {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            deadline: None,
        }
    }

    /// Record the latest liveness flag and cursor. Arms the timer if idle.
    pub fn signal(&mut self, has_more: bool, cursor: Cursor, now: Instant) {
        self.pending = Some((has_more, cursor));
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// When the armed timer fires, if armed
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Commit if the window has closed
    pub fn fire(&mut self, now: Instant, accumulator: &BatchAccumulator) -> Option<PendingAppend> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.flush(accumulator),
            _ => None,
        }
    }

    /// Commit immediately regardless of the window
    pub fn flush(&mut self, accumulator: &BatchAccumulator) -> Option<PendingAppend> {
        self.deadline = None;
        let (has_more, cursor) = self.pending.take()?;
        Some(PendingAppend {
            events: accumulator.drain_all(),
            has_more,
            cursor,
        })
    }

    /// Disarm without committing
    pub fn cancel(&mut self) {
        self.pending = None;
        self.deadline = None;
    }
}
