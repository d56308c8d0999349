use crate::cache::RunCache;
use crate::event::RunStatus;
use std::sync::Arc;
use tracing::{debug, warn};

/// Writes statuses derived from the event stream into the shared run cache.
///
/// Callers must only pass statuses from batches that are no longer
/// replaying history; a status seen mid-backfill may be older than the
/// run's real state.
#[derive(Clone)]
pub struct StatusSynchronizer {
    cache: Arc<dyn RunCache>,
}

impl StatusSynchronizer {
    pub fn new(cache: Arc<dyn RunCache>) -> Self {
        Self { cache }
    }

    /// Update the cached record of `run_id`. Returns whether a write happened.
    ///
    /// Runs the cache does not know are left alone. Statuses past the point
    /// of no return also clear `can_terminate`.
    pub fn sync(&self, run_id: &str, status: RunStatus) -> bool {
        let mut record = match self.cache.read(run_id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(run_id = %run_id, status = %status, "Run not cached, skipping status sync");
                return false;
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Failed to read cached run");
                return false;
            }
        };

        record.status = status;
        if status.revokes_termination() {
            record.can_terminate = false;
        }

        match self.cache.write(run_id, record) {
            Ok(()) => {
                debug!(run_id = %run_id, status = %status, "Synced run status to cache");
                true
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Failed to write cached run");
                false
            }
        }
    }
}

impl std::fmt::Debug for StatusSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusSynchronizer").finish_non_exhaustive()
    }
}
