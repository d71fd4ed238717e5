//! Unified error classification and recovery.

use strum::{Display, EnumString};

/// Canonical status string carried in Google API error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    InvalidArgument,
    FailedPrecondition,
    OutOfRange,
    Unauthenticated,
    PermissionDenied,
    NotFound,
    ResourceExhausted,
    Cancelled,
    DeadlineExceeded,
    Internal,
    Unavailable,
    Unknown,
    /// Any status this crate does not model explicitly.
    #[strum(default)]
    Other(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorCategory {
    /// Server errors, rate/quota limits, dropped connections.
    Transient,
    /// Auth, bad requests and other client errors.
    Permanent,
    SafetyBlock,
    ContextOverflow,
    Configuration,
    Storage,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    /// Prune or summarize history before sending again.
    ReduceInputSize,
    ReviewPrompt,
    CheckStorage,
    ContactSupport,
}
