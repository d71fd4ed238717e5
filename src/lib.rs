//! Gemini sessions for simulation agents.
//!
//! Each agent gets a [`session::GeminiConnector`] that rebuilds its
//! conversation from a durable turn log, sends prompts to Gemini, separates
//! the model's reasoning from its answer, tracks token usage, and classifies
//! failures so the caller can decide whether to retry.
//!
//! # Quick Start
//!
//! ```no_run
//! use station_connector::prelude::*;
//!
//! # async fn example() -> station_connector::error::Result<()> {
//! let config = ConnectorConfig::builder()
//!     .model_name("gemini-2.5-pro")
//!     .agent_name("ada")
//!     .agent_data_path("data/agents/ada")
//!     .build();
//! let mut connector = GeminiConnector::connect(config)?;
//! let reply = connector.send_message("Hello", 1).await?;
//! println!("{}", reply.answer);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod store;
pub mod types;
pub mod util;
