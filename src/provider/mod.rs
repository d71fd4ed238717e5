//! Provider API seam.
//!
//! [`GeminiApi`] is the stateless transport surface the connector needs. The
//! conversation itself is kept client-side by [`crate::session::ChatSession`].

pub mod http;

#[cfg(feature = "google")]
pub mod google;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ProviderFailure;
use crate::types::{Content, GenerateContentRequest, GenerateContentResponse};

/// Stream of response chunks from a streamed request.
pub type ChunkStream = BoxStream<'static, Result<GenerateContentResponse, ProviderFailure>>;

/// Core trait implemented by the Gemini transport.
///
/// A single client may be shared by many agents; implementations hold no
/// per-session state.
#[async_trait]
pub trait GeminiApi: Send + Sync {
    /// Generate a full response in one request.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderFailure>;

    /// Generate a response as a stream of chunks.
    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, ProviderFailure>;

    /// Count the tokens `contents` would occupy in the model's context.
    async fn count_tokens(&self, model: &str, contents: &[Content]) -> Result<u32, ProviderFailure>;
}
