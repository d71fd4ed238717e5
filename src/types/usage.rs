//! Token usage for a single exchange.

use serde::{Deserialize, Serialize};

use super::content::UsageMetadata;

/// Token counts for one prompt/response exchange.
///
/// Every field is independently optional: a count the provider did not
/// report stays `None` rather than defaulting to zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub total_tokens_in_session: Option<u32>,
    pub last_exchange_prompt_tokens: Option<u32>,
    pub last_exchange_completion_tokens: Option<u32>,
    pub last_exchange_cached_tokens: Option<u32>,
    pub last_exchange_thoughts_tokens: Option<u32>,
}

impl TokenInfo {
    /// Map provider usage metadata field by field.
    pub fn from_usage(usage: Option<&UsageMetadata>) -> Self {
        let Some(usage) = usage else {
            return Self::default();
        };
        Self {
            total_tokens_in_session: usage.total_token_count,
            last_exchange_prompt_tokens: usage.prompt_token_count,
            last_exchange_completion_tokens: usage.candidates_token_count,
            last_exchange_cached_tokens: usage.cached_content_token_count,
            last_exchange_thoughts_tokens: usage.thoughts_token_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
