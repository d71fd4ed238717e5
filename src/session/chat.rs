//! Client-side conversation session over a [`GeminiApi`].

use std::sync::Arc;

use crate::error::{ProviderFailure, ProviderStatus};
use crate::provider::GeminiApi;
use crate::types::{Content, GenerateContentRequest, Part, Role, SessionSettings};

use super::response::AssembledResponse;

/// A live conversation: the seeded history plus every completed exchange.
///
/// Each request carries the full history. An exchange is appended to the
/// history only once a response with answer text has been fully assembled.
pub struct ChatSession {
    api: Arc<dyn GeminiApi>,
    model: String,
    settings: SessionSettings,
    history: Vec<Content>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.model)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create a session seeded with `history`.
    pub fn create(
        api: Arc<dyn GeminiApi>,
        model: impl Into<String>,
        settings: SessionSettings,
        history: Vec<Content>,
    ) -> Result<Self, ProviderFailure> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(ProviderFailure::client(
                400,
                ProviderStatus::InvalidArgument,
                "model name must not be empty",
            ));
        }
        if let Some(index) = history.iter().position(|content| content.parts.is_empty()) {
            return Err(ProviderFailure::client(
                400,
                ProviderStatus::InvalidArgument,
                format!("history content {index} has no parts"),
            ));
        }
        Ok(Self {
            api,
            model,
            settings,
            history,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    fn request_for(&self, prompt: &str) -> GenerateContentRequest {
        let mut contents = Vec::with_capacity(self.history.len() + 1);
        contents.extend(self.history.iter().cloned());
        contents.push(Content::user(prompt));
        GenerateContentRequest::new(contents, &self.settings)
    }

    /// Send `prompt` as one request.
    pub async fn send_message(&mut self, prompt: &str) -> Result<AssembledResponse, ProviderFailure> {
        let request = self.request_for(prompt);
        let response = self.api.generate_content(&self.model, &request).await?;
        let assembled = AssembledResponse::from_response(response);
        self.record(prompt, &assembled);
        Ok(assembled)
    }

    /// Send `prompt` as a streamed request and consume the whole stream.
    pub async fn send_message_stream(
        &mut self,
        prompt: &str,
    ) -> Result<AssembledResponse, ProviderFailure> {
        let request = self.request_for(prompt);
        let stream = self.api.stream_generate_content(&self.model, &request).await?;
        let assembled = AssembledResponse::from_stream(stream).await?;
        self.record(prompt, &assembled);
        Ok(assembled)
    }

    /// Count the tokens of the current history.
    pub async fn count_tokens(&self) -> Result<u32, ProviderFailure> {
        self.api.count_tokens(&self.model, &self.history).await
    }

    /// Keep only parts with text. An exchange whose reply has no answer
    /// text is not kept, matching what the turn log can rebuild.
    fn record(&mut self, prompt: &str, assembled: &AssembledResponse) {
        if !assembled.has_candidates {
            return;
        }
        let parts: Vec<Part> = assembled
            .parts
            .iter()
            .filter(|part| part.text.as_deref().is_some_and(|text| !text.is_empty()))
            .cloned()
            .collect();
        if parts.iter().all(Part::is_thought) {
            return;
        }
        self.history.push(Content::user(prompt));
        self.history.push(Content {
            role: Some(Role::Model),
            parts,
        });
    }
}
