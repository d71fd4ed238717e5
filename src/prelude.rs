//! Convenience re-exports for common use.

pub use crate::config::ConnectorConfig;
pub use crate::error::{ConnectorError, ErrorCategory, Result};
pub use crate::history::RetentionPolicy;
pub use crate::provider::GeminiApi;
pub use crate::session::{GeminiConnector, Reply};
pub use crate::store::{FileTurnLog, InMemoryTurnLog, TurnLog};
pub use crate::types::{Role, TokenInfo, Turn};
