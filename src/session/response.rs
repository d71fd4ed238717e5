//! Assembly of single-shot and streamed responses into one value.

use futures::TryStreamExt;

use crate::error::ProviderFailure;
use crate::provider::ChunkStream;
use crate::types::{GenerateContentResponse, Part, PromptFeedback, UsageMetadata};

/// A complete model response, however it was delivered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledResponse {
    /// Parts of the first candidate, in delivery order.
    pub parts: Vec<Part>,
    /// Whether any response or chunk carried a candidate at all.
    pub has_candidates: bool,
    /// First prompt feedback seen.
    pub prompt_feedback: Option<PromptFeedback>,
    /// Last non-empty usage metadata seen.
    pub usage_metadata: Option<UsageMetadata>,
}

impl AssembledResponse {
    pub fn from_response(response: GenerateContentResponse) -> Self {
        Self::default().absorb(response)
    }

    /// Fold one response chunk into the accumulated response.
    pub fn absorb(mut self, chunk: GenerateContentResponse) -> Self {
        if self.prompt_feedback.is_none() {
            self.prompt_feedback = chunk.prompt_feedback;
        }
        if let Some(usage) = chunk.usage_metadata.filter(|usage| !usage.is_empty()) {
            self.usage_metadata = Some(usage);
        }
        if let Some(candidate) = chunk.candidates.into_iter().next() {
            self.has_candidates = true;
            if let Some(content) = candidate.content {
                self.parts.extend(content.parts);
            }
        }
        self
    }

    /// Consume a chunk stream to completion.
    ///
    /// The first failing chunk aborts the fold; nothing partial is returned.
    pub async fn from_stream(stream: ChunkStream) -> Result<Self, ProviderFailure> {
        stream
            .try_fold(Self::default(), |acc, chunk| async move { Ok::<_, ProviderFailure>(acc.absorb(chunk)) })
            .await
    }
}
