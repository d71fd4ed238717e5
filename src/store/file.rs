use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{StoreError, TurnLog};
use crate::types::TurnRecord;

/// File name of the turn log inside an agent's data directory.
pub const HISTORY_FILE_NAME: &str = "chat_history.jsonl";

/// Turn log stored as JSON Lines, one record per line.
///
/// # Example
/// ```no_run
/// use station_connector::store::{FileTurnLog, TurnLog};
/// use station_connector::types::{Turn, TurnRecord};
///
/// let log = FileTurnLog::in_agent_dir("data/agents/ada");
/// log.append(&TurnRecord::from(&Turn::user(1, "Hello")))?;
/// # Ok::<(), station_connector::store::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTurnLog {
    path: PathBuf,
}

impl FileTurnLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log at the conventional location within an agent's data directory.
    pub fn in_agent_dir(agent_data_path: impl AsRef<Path>) -> Self {
        Self::new(agent_data_path.as_ref().join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TurnLog for FileTurnLog {
    fn load_all(&self) -> Result<Vec<TurnRecord>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<TurnRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => tracing::warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %err,
                    "skipping malformed turn log line"
                ),
            }
        }
        Ok(records)
    }

    fn append(&self, record: &TurnRecord) -> Result<(), StoreError> {
        self.append_all(std::slice::from_ref(record))
    }

    /// Serializes every record before touching the file, then writes them
    /// with a single call.
    fn append_all(&self, records: &[TurnRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&serde_json::to_string(record)?);
            buffer.push('\n');
        }

        Self::ensure_parent(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buffer.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
