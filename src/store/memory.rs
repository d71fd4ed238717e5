use std::sync::Mutex;

use super::{StoreError, TurnLog};
use crate::types::TurnRecord;

/// Turn log held in memory, for tests and ephemeral agents.
#[derive(Debug, Default)]
pub struct InMemoryTurnLog {
    records: Mutex<Vec<TurnRecord>>,
}

impl InMemoryTurnLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TurnRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Snapshot of everything appended so far.
    pub fn records(&self) -> Vec<TurnRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl TurnLog for InMemoryTurnLog {
    fn load_all(&self) -> Result<Vec<TurnRecord>, StoreError> {
        Ok(self.records())
    }

    fn append(&self, record: &TurnRecord) -> Result<(), StoreError> {
        self.append_all(std::slice::from_ref(record))
    }

    fn append_all(&self, records: &[TurnRecord]) -> Result<(), StoreError> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend_from_slice(records);
        Ok(())
    }
}
