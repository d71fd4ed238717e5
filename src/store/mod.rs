//! Durable per-agent turn storage.

pub mod file;
pub mod memory;

pub use file::FileTurnLog;
pub use memory::InMemoryTurnLog;

use thiserror::Error;

use crate::types::TurnRecord;

/// Errors raised by a [`TurnLog`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only log of conversation turns for a single agent.
///
/// Implementations are only called from the agent that owns the log.
pub trait TurnLog: Send + Sync {
    /// Read every well-formed record in append order.
    ///
    /// Lines that cannot be decoded are skipped, never fatal.
    fn load_all(&self) -> Result<Vec<TurnRecord>, StoreError>;

    fn append(&self, record: &TurnRecord) -> Result<(), StoreError>;

    /// Append several records as one unit.
    fn append_all(&self, records: &[TurnRecord]) -> Result<(), StoreError> {
        for record in records {
            self.append(record)?;
        }
        Ok(())
    }
}
