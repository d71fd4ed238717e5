//! Turns persisted to the per-agent turn log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::Role;
use super::usage::TokenInfo;

/// One side of an exchange, as recorded in the turn log.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Simulation clock value assigned by the caller.
    pub tick: u64,
    pub role: Role,
    pub text: String,
    pub reasoning_text: Option<String>,
    pub usage: Option<TokenInfo>,
}

impl Turn {
    pub fn user(tick: u64, text: impl Into<String>) -> Self {
        Self {
            tick,
            role: Role::User,
            text: text.into(),
            reasoning_text: None,
            usage: None,
        }
    }

    pub fn model(
        tick: u64,
        text: impl Into<String>,
        reasoning_text: Option<String>,
        usage: TokenInfo,
    ) -> Self {
        Self {
            tick,
            role: Role::Model,
            text: text.into(),
            reasoning_text,
            usage: Some(usage),
        }
    }

    /// Turns with neither answer nor reasoning text are never persisted.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.reasoning_text.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordPart {
    #[serde(default)]
    pub text: Option<String>,
}

/// A raw line of the turn log.
///
/// Deserialization is lenient: required fields are optional here so that a
/// structurally valid but incomplete record can be reported and skipped by
/// the history pruner instead of failing the whole load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TurnRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<RecordPart>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl From<&Turn> for TurnRecord {
    fn from(turn: &Turn) -> Self {
        Self {
            tick: Some(turn.tick),
            role: Some(turn.role.to_string()),
            parts: Some(vec![RecordPart {
                text: Some(turn.text.clone()),
            }]),
            thinking_content: turn.reasoning_text.clone().filter(|text| !text.is_empty()),
            token_info: match turn.role {
                Role::Model => turn.usage.clone(),
                Role::User => None,
            },
            recorded_at: Some(Utc::now()),
        }
    }
}
