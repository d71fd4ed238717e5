//! Reasoning configuration derived from the model identifier.

use crate::types::{ThinkingConfig, ThinkingLevel};

/// Thinking budget for model families that take a token budget.
pub const THINKING_BUDGET_TOKENS: u32 = 24_576;

const BUDGET_FAMILIES: [&str; 2] = ["gemini-2.5", "gemini-2.0"];

/// Pick the thinking configuration for `model_name`.
///
/// The 2.x families take a fixed token budget; newer ones take a qualitative
/// level. Thoughts are always requested so they can be recorded.
pub fn thinking_config_for_model(model_name: &str) -> ThinkingConfig {
    let lowered = model_name.trim().to_ascii_lowercase();
    let model = lowered.strip_prefix("models/").unwrap_or(&lowered);

    if BUDGET_FAMILIES.iter().any(|family| model.starts_with(family)) {
        ThinkingConfig {
            include_thoughts: true,
            thinking_budget: Some(THINKING_BUDGET_TOKENS),
            thinking_level: None,
        }
    } else {
        ThinkingConfig {
            include_thoughts: true,
            thinking_budget: None,
            thinking_level: Some(ThinkingLevel::High),
        }
    }
}
