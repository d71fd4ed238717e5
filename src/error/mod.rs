//! Error types for the connector.

pub mod classify;
pub mod unified;

pub use classify::{classify, FailureKind, ProviderFailure};
pub use unified::{ErrorCategory, ProviderStatus, RecoverySuggestion};

use thiserror::Error;

use crate::store::StoreError;
use crate::types::PromptFeedback;

/// Primary error type for all connector operations.
///
/// Variants map one-to-one onto the categories a caller branches on: only
/// [`ConnectorError::Transient`] is eligible for a blind retry.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transient API error: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<ProviderFailure>,
    },

    #[error("Permanent API error: {message}")]
    Permanent {
        message: String,
        #[source]
        source: Option<ProviderFailure>,
    },

    #[error("Safety block: {message}")]
    SafetyBlock {
        message: String,
        block_reason: Option<String>,
        prompt_feedback: Option<PromptFeedback>,
    },

    #[error("Context window overflow: {message}")]
    ContextOverflow {
        message: String,
        #[source]
        source: Option<ProviderFailure>,
    },

    #[error("Unexpected connector failure: {message}")]
    Unexpected {
        message: String,
        #[source]
        source: Option<ProviderFailure>,
    },

    #[error("Turn log error: {0}")]
    Store(#[from] StoreError),
}

impl ConnectorError {
    /// Create a transient error without an underlying provider failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            source: None,
        }
    }

    /// Create a permanent error without an underlying provider failure.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
            source: None,
        }
    }

    /// Create a safety block from the prompt feedback of an empty response.
    pub fn safety_block(agent: &str, prompt_feedback: Option<PromptFeedback>) -> Self {
        let block_reason = prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone());
        let detail = match &block_reason {
            Some(reason) => format!("Reason: {reason}."),
            None => "Unknown (no candidates)".to_string(),
        };
        Self::SafetyBlock {
            message: format!("LLM response generation failed for {agent}. {detail}"),
            block_reason,
            prompt_feedback,
        }
    }

    /// The provider failure this error was classified from, if any.
    pub fn provider_failure(&self) -> Option<&ProviderFailure> {
        match self {
            Self::Transient { source, .. }
            | Self::Permanent { source, .. }
            | Self::ContextOverflow { source, .. }
            | Self::Unexpected { source, .. } => source.as_ref(),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Transient { .. } => ErrorCategory::Transient,
            Self::Permanent { .. } => ErrorCategory::Permanent,
            Self::SafetyBlock { .. } => ErrorCategory::SafetyBlock,
            Self::ContextOverflow { .. } => ErrorCategory::ContextOverflow,
            Self::Store(_) => ErrorCategory::Storage,
            Self::Unexpected { .. } => ErrorCategory::Unknown,
        }
    }

    /// Whether this error is eligible for a retry with the same history.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Transient => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Permanent => match self.provider_failure().and_then(|f| f.status.as_ref()) {
                Some(ProviderStatus::Unauthenticated | ProviderStatus::PermissionDenied) => {
                    RecoverySuggestion::CheckCredentials
                }
                _ => match self.provider_failure().and_then(|f| f.http_status) {
                    Some(401 | 403) => RecoverySuggestion::CheckCredentials,
                    _ => RecoverySuggestion::ContactSupport,
                },
            },
            ErrorCategory::SafetyBlock => RecoverySuggestion::ReviewPrompt,
            ErrorCategory::ContextOverflow => RecoverySuggestion::ReduceInputSize,
            ErrorCategory::Configuration => RecoverySuggestion::CheckConfiguration,
            ErrorCategory::Storage => RecoverySuggestion::CheckStorage,
            ErrorCategory::Unknown => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConnectorError>;
