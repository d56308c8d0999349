use super::traits::{CacheError, RunCache, RunRecord};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local run cache
#[derive(Debug, Default)]
pub struct MemoryRunCache {
    records: RwLock<HashMap<String, RunRecord>>,
}

impl MemoryRunCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, run_id: impl Into<String>, record: RunRecord) -> Result<(), CacheError> {
        let mut records = self.records.write().map_err(|_| CacheError::Poisoned)?;
        records.insert(run_id.into(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RunCache for MemoryRunCache {
    fn read(&self, run_id: &str) -> Result<Option<RunRecord>, CacheError> {
        let records = self.records.read().map_err(|_| CacheError::Poisoned)?;
        Ok(records.get(run_id).cloned())
    }

    fn write(&self, run_id: &str, record: RunRecord) -> Result<(), CacheError> {
        self.insert(run_id, record)
    }
}
