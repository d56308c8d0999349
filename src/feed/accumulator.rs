use crate::event::RunEvent;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Unbounded queue of events waiting for the next dispatcher commit.
///
/// The transport side only appends and the dispatcher only drains, so a
/// drain always returns exactly what was appended since the previous one.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    queue: Arc<Mutex<Vec<RunEvent>>>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append events in call order
    pub fn enqueue<I>(&self, events: I)
    where
        I: IntoIterator<Item = RunEvent>,
    {
        self.lock().extend(events);
    }

    /// Take everything queued so far, leaving the queue empty
    pub fn drain_all(&self) -> Vec<RunEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Drop queued events. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        let mut queue = self.lock();
        let discarded = queue.len();
        queue.clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RunEvent>> {
        // A panic mid-extend cannot leave the Vec itself invalid
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
