//! Mapping from provider failure shapes onto [`ConnectorError`].
//!
//! Everything provider-specific about a failed call is captured once in a
//! [`ProviderFailure`] at the transport boundary; [`classify`] is a pure
//! function over it.

use std::sync::LazyLock;

use regex::Regex;
use strum::Display;
use thiserror::Error;

use super::unified::ProviderStatus;
use super::ConnectorError;

static CONTEXT_OVERFLOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)input token count(?:\s*\(\d+\))? exceeds the maximum number of tokens allowed",
    )
    .expect("context overflow regex must compile")
});

/// Coarse shape of a failed provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 5xx.
    Server,
    /// HTTP 4xx.
    Client,
    /// Connection dropped, timed out, or never established.
    Transport,
    /// Response body could not be decoded.
    Decode,
    Other,
}

/// Structured description of a failed provider call.
#[derive(Debug, Clone, Error)]
#[error("{kind} failure: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub http_status: Option<u16>,
    pub status: Option<ProviderStatus>,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// A 4xx failure with the provider's canonical status string.
    pub fn client(http_status: u16, status: ProviderStatus, message: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status),
            status: Some(status),
            ..Self::new(FailureKind::Client, message)
        }
    }

    /// A 5xx failure.
    pub fn server(http_status: u16, message: impl Into<String>) -> Self {
        Self {
            http_status: Some(http_status),
            ..Self::new(FailureKind::Server, message)
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, message)
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn has_status(&self, status: &ProviderStatus) -> bool {
        self.status.as_ref() == Some(status)
    }

    /// An invalid-argument client error reporting that the prompt is larger
    /// than the model's input window.
    pub fn is_context_overflow(&self) -> bool {
        self.kind == FailureKind::Client
            && self.has_status(&ProviderStatus::InvalidArgument)
            && CONTEXT_OVERFLOW_RE.is_match(&self.message)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == FailureKind::Client
            && (self.has_status(&ProviderStatus::ResourceExhausted) || self.http_status == Some(429))
    }
}

/// Classify a provider failure for `agent`.
///
/// Precedence: context overflow, then rate/quota exhaustion (transient), then
/// remaining client errors (permanent), then server and transport errors
/// (transient). Anything else is wrapped as [`ConnectorError::Unexpected`]
/// with the failure kept as its source. Safety blocks never reach this
/// function: they are raised directly by the send path.
pub fn classify(agent: &str, failure: ProviderFailure) -> ConnectorError {
    if failure.is_context_overflow() {
        tracing::error!(agent, message = %failure.message, "context window overflow detected");
        return ConnectorError::ContextOverflow {
            message: format!("Context window overflow for {agent}: {}", failure.message),
            source: Some(failure),
        };
    }

    if failure.is_rate_limited() {
        return ConnectorError::Transient {
            message: format!("Gemini API quota/rate limit error for {agent}: {}", failure.message),
            source: Some(failure),
        };
    }

    match failure.kind {
        FailureKind::Client => ConnectorError::Permanent {
            message: format!("Gemini API client error for {agent}: {}", failure.message),
            source: Some(failure),
        },
        FailureKind::Server => {
            tracing::debug!(
                agent,
                http_status = ?failure.http_status,
                status = ?failure.status,
                details = ?failure.details,
                "raw Gemini server error"
            );
            ConnectorError::Transient {
                message: format!("Gemini API server error for {agent}: {}", failure.message),
                source: Some(failure),
            }
        }
        FailureKind::Transport => ConnectorError::Transient {
            message: format!("Gemini API connection error for {agent}: {}", failure.message),
            source: Some(failure),
        },
        FailureKind::Decode | FailureKind::Other => {
            tracing::debug!(agent, kind = %failure.kind, details = ?failure.details, "unrecognized provider failure");
            ConnectorError::Unexpected {
                message: format!(
                    "Unexpected LLM API call failure for {agent}. Details: {}",
                    failure.message
                ),
                source: Some(failure),
            }
        }
    }
}
