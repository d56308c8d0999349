use crate::event::RunStatus;
use serde::{Deserialize, Serialize};

/// Shared read cache keyed by run id.
///
/// Owned by whoever renders run summaries; the log feed only performs a
/// read-modify-write on the record of the run it is following.
pub trait RunCache: Send + Sync {
    fn read(&self, run_id: &str) -> Result<Option<RunRecord>, CacheError>;
    fn write(&self, run_id: &str, record: RunRecord) -> Result<(), CacheError>;
}

/// Cached summary of a run. Fields the feed does not manage are carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub status: RunStatus,
    pub can_terminate: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RunRecord {
    pub fn new(status: RunStatus, can_terminate: bool) -> Self {
        Self {
            status,
            can_terminate,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache lock poisoned")]
    Poisoned,
}
