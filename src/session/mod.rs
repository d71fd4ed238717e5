//! Live conversation sessions and the per-agent connector.

pub mod accounting;
pub mod chat;
pub mod connector;
pub mod response;
pub mod segregate;

pub use chat::ChatSession;
pub use connector::{GeminiConnector, HistoryMessage, Reply};
pub use response::AssembledResponse;
pub use segregate::{segregate, Segregated};
