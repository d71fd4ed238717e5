//! Core types for the connector.

pub mod content;
pub mod request;
pub mod turn;
pub mod usage;

pub use content::*;
pub use request::*;
pub use turn::*;
pub use usage::*;
