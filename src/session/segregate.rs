//! Separation of reasoning text from answer text.

use crate::types::Part;

/// Answer and reasoning text of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segregated {
    /// Non-reasoning text, concatenated without separators.
    pub answer: String,
    /// Reasoning text joined with newlines; `None` when no part carried any.
    pub reasoning: Option<String>,
}

/// Split `parts` into reasoning and answer text, preserving part order.
///
/// A part counts as reasoning only when it is marked as a thought and has
/// non-empty text. Parts with empty text contribute nothing.
pub fn segregate(parts: &[Part]) -> Segregated {
    let (reasoning, answer) = parts
        .iter()
        .filter_map(|part| {
            part.text
                .as_deref()
                .filter(|text| !text.is_empty())
                .map(|text| (part.is_thought(), text))
        })
        .fold(
            (Vec::new(), String::new()),
            |(mut reasoning, mut answer), (is_thought, text)| {
                if is_thought {
                    reasoning.push(text);
                } else {
                    answer.push_str(text);
                }
                (reasoning, answer)
            },
        );

    Segregated {
        answer,
        reasoning: (!reasoning.is_empty()).then(|| reasoning.join("\n")),
    }
}
