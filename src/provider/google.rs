//! Google Gemini REST client.

use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use tracing::debug;

use crate::error::{ConnectorError, ProviderFailure};
use crate::types::{
    Content, CountTokensRequest, CountTokensResponse, GenerateContentRequest,
    GenerateContentResponse,
};

use super::http::{failure_from_reqwest, failure_from_status, parse_sse_data, SseLineBuffer};
use super::{ChunkStream, GeminiApi};

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Whole-request limit for single-shot calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
/// Longest silence tolerated between reads. Streamed calls have no
/// whole-request limit.
pub const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// [`GeminiApi`] over the public REST endpoint.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for GoogleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GoogleClient {
    /// Build a client for `api_key`.
    ///
    /// Fails with a permanent error if the key is not a valid header value or
    /// the HTTP client cannot be constructed.
    pub fn new(api_key: &str, base_url: Option<String>) -> Result<Self, ConnectorError> {
        Self::with_timeouts(api_key, base_url, REQUEST_TIMEOUT, READ_TIMEOUT)
    }

    /// Build a client with explicit limits. `request_timeout` bounds
    /// single-shot calls; `read_timeout` bounds each read on every call.
    pub fn with_timeouts(
        api_key: &str,
        base_url: Option<String>,
        request_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, ConnectorError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ConnectorError::permanent(format!("invalid Google API key: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .read_timeout(read_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ConnectorError::permanent(format!("error creating Gemini HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            request_timeout,
        })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        streaming: bool,
    ) -> Result<reqwest::Response, ProviderFailure> {
        let mut request = self.http.post(url).json(body);
        if !streaming {
            request = request.timeout(self.request_timeout);
        }
        let resp = request.send().await.map_err(failure_from_reqwest)?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(failure_from_status(status, &body_text));
        }
        Ok(resp)
    }
}

/// Decode an SSE body into response chunks.
///
/// The stream ends at the first transport or decode failure.
fn decode_sse_stream<S, B>(byte_stream: S) -> ChunkStream
where
    S: Stream<Item = Result<B, ProviderFailure>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut lines = SseLineBuffer::default();
        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(failure) => {
                    yield Err(failure);
                    return;
                }
            };

            lines.push(chunk.as_ref());
            while let Some(line) = lines.next_line() {
                match decode_sse_line(line) {
                    Ok(Some(resp)) => yield Ok(resp),
                    Ok(None) => {}
                    Err(failure) => {
                        yield Err(failure);
                        return;
                    }
                }
            }
        }

        if let Some(line) = lines.finish() {
            match decode_sse_line(line) {
                Ok(Some(resp)) => yield Ok(resp),
                Ok(None) => {}
                Err(failure) => yield Err(failure),
            }
        }
    };
    Box::pin(stream)
}

fn decode_sse_line(
    line: Result<String, std::str::Utf8Error>,
) -> Result<Option<GenerateContentResponse>, ProviderFailure> {
    let line = line.map_err(|e| ProviderFailure::decode(format!("invalid UTF-8 in stream: {e}")))?;
    let Some(data) = parse_sse_data(&line) else {
        return Ok(None);
    };
    serde_json::from_str::<GenerateContentResponse>(data)
        .map(Some)
        .map_err(|e| {
            ProviderFailure::decode(format!("invalid stream chunk: {e}"))
                .with_details(serde_json::Value::String(data.to_string()))
        })
}

#[async_trait]
impl GeminiApi for GoogleClient {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderFailure> {
        debug!(model, contents = request.contents.len(), "Google generate_content");
        let resp = self.post(&self.model_url(model, "generateContent"), request, false).await?;
        resp.json().await.map_err(failure_from_reqwest)
    }

    async fn stream_generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, ProviderFailure> {
        debug!(model, contents = request.contents.len(), "Google stream_generate_content");
        let url = format!("{}?alt=sse", self.model_url(model, "streamGenerateContent"));
        let resp = self.post(&url, request, true).await?;
        Ok(decode_sse_stream(
            resp.bytes_stream().map(|chunk| chunk.map_err(failure_from_reqwest)),
        ))
    }

    async fn count_tokens(&self, model: &str, contents: &[Content]) -> Result<u32, ProviderFailure> {
        debug!(model, contents = contents.len(), "Google count_tokens");
        let resp = self
            .post(&self.model_url(model, "countTokens"), &CountTokensRequest { contents }, false)
            .await?;
        let counted: CountTokensResponse = resp.json().await.map_err(failure_from_reqwest)?;
        Ok(counted.total_tokens)
    }
}
