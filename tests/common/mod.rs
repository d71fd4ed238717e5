//! Shared test helpers and mock Gemini API.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use station_connector::config::ConnectorConfig;
use station_connector::error::ProviderFailure;
use station_connector::history::RetentionPolicy;
use station_connector::provider::{ChunkStream, GeminiApi};
use station_connector::session::GeminiConnector;
use station_connector::store::InMemoryTurnLog;
use station_connector::types::*;

/// Which API method served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Generate,
    Stream,
}

type ChunkScript = Result<Vec<Result<GenerateContentResponse, ProviderFailure>>, ProviderFailure>;

/// A mock API that replays scripted outcomes and records every request.
///
/// Unscripted calls return a plain "Mock response" (generate and stream)
/// or a 503 failure (count_tokens).
#[derive(Default)]
pub struct MockGeminiApi {
    generate: Mutex<VecDeque<Result<GenerateContentResponse, ProviderFailure>>>,
    streams: Mutex<VecDeque<ChunkScript>>,
    counts: Mutex<VecDeque<Result<u32, ProviderFailure>>>,
    requests: Mutex<Vec<(CallKind, GenerateContentRequest)>>,
    count_requests: Mutex<Vec<Vec<Content>>>,
}

impl MockGeminiApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queue_response(&self, response: GenerateContentResponse) {
        self.generate.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_failure(&self, failure: ProviderFailure) {
        self.generate.lock().unwrap().push_back(Err(failure));
    }

    pub fn queue_stream(&self, chunks: Vec<GenerateContentResponse>) {
        self.streams
            .lock()
            .unwrap()
            .push_back(Ok(chunks.into_iter().map(Ok).collect()));
    }

    pub fn queue_stream_chunks(&self, chunks: Vec<Result<GenerateContentResponse, ProviderFailure>>) {
        self.streams.lock().unwrap().push_back(Ok(chunks));
    }

    pub fn queue_stream_failure(&self, failure: ProviderFailure) {
        self.streams.lock().unwrap().push_back(Err(failure));
    }

    pub fn queue_count(&self, result: Result<u32, ProviderFailure>) {
        self.counts.lock().unwrap().push_back(result);
    }

    pub fn requests(&self) -> Vec<(CallKind, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_kinds(&self) -> Vec<CallKind> {
        self.requests().into_iter().map(|(kind, _)| kind).collect()
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        self.requests().pop().map(|(_, request)| request)
    }

    pub fn count_requests(&self) -> Vec<Vec<Content>> {
        self.count_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeminiApi for MockGeminiApi {
    async fn generate_content(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderFailure> {
        self.requests
            .lock()
            .unwrap()
            .push((CallKind::Generate, request.clone()));
        self.generate
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(response(vec![Part::text("Mock response")], None)))
    }

    async fn stream_generate_content(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<ChunkStream, ProviderFailure> {
        self.requests
            .lock()
            .unwrap()
            .push((CallKind::Stream, request.clone()));
        let chunks = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![Ok(response(vec![Part::text("Mock streamed response")], None))]))?;

        let stream = async_stream::stream! {
            for chunk in chunks {
                yield chunk;
            }
        };
        Ok(Box::pin(stream))
    }

    async fn count_tokens(&self, _model: &str, contents: &[Content]) -> Result<u32, ProviderFailure> {
        self.count_requests.lock().unwrap().push(contents.to_vec());
        self.counts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderFailure::server(503, "count_tokens not scripted")))
    }
}

/// A response whose single candidate carries `parts`.
pub fn response(parts: Vec<Part>, usage: Option<UsageMetadata>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![Candidate {
            content: Some(Content {
                role: Some(Role::Model),
                parts,
            }),
            finish_reason: Some("STOP".to_string()),
        }],
        prompt_feedback: None,
        usage_metadata: usage,
    }
}

/// A response with no candidates, as returned for a blocked prompt.
pub fn blocked(reason: Option<&str>) -> GenerateContentResponse {
    GenerateContentResponse {
        candidates: vec![],
        prompt_feedback: Some(PromptFeedback {
            block_reason: reason.map(ToString::to_string),
            safety_ratings: vec![],
        }),
        usage_metadata: None,
    }
}

pub fn usage(prompt: u32, completion: u32, total: Option<u32>) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: Some(prompt),
        candidates_token_count: Some(completion),
        cached_content_token_count: None,
        thoughts_token_count: None,
        total_token_count: total,
    }
}

pub fn record(tick: u64, role: &str, text: &str) -> TurnRecord {
    TurnRecord {
        tick: Some(tick),
        role: Some(role.to_string()),
        parts: Some(vec![RecordPart {
            text: Some(text.to_string()),
        }]),
        ..Default::default()
    }
}

pub fn config() -> ConnectorConfig {
    ConnectorConfig::builder()
        .model_name("gemini-2.5-pro")
        .agent_name("ada")
        .agent_data_path("unused")
        .api_key("test-key")
        .retry_delay_secs(0)
        .build()
}

pub fn config_with_retention(retention: RetentionPolicy) -> ConnectorConfig {
    ConnectorConfig {
        retention,
        ..config()
    }
}

pub fn connector(
    config: ConnectorConfig,
    api: &Arc<MockGeminiApi>,
    log: &Arc<InMemoryTurnLog>,
) -> GeminiConnector {
    GeminiConnector::with_parts(config, api.clone(), log.clone()).expect("connector")
}
