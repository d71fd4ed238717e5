//! Tests for the error system.

use station_connector::error::*;
use station_connector::store::StoreError;
use station_connector::types::PromptFeedback;

#[test]
fn safety_block_message_names_agent_and_reason() {
    let err = ConnectorError::safety_block(
        "ada",
        Some(PromptFeedback {
            block_reason: Some("SAFETY".to_string()),
            safety_ratings: vec![],
        }),
    );
    assert_eq!(
        err.to_string(),
        "Safety block: LLM response generation failed for ada. Reason: SAFETY."
    );
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: ConnectorError,
        expected_category: ErrorCategory,
        expected_retryable: bool,
        expected_recovery: RecoverySuggestion,
    }

    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");

    let cases = vec![
        Case {
            error: ConnectorError::Configuration("no key".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: classify("ada", ProviderFailure::server(503, "overloaded")),
            expected_category: ErrorCategory::Transient,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: classify("ada", ProviderFailure::transport("connection reset")),
            expected_category: ErrorCategory::Transient,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: classify(
                "ada",
                ProviderFailure::client(429, ProviderStatus::ResourceExhausted, "quota"),
            ),
            expected_category: ErrorCategory::Transient,
            expected_retryable: true,
            expected_recovery: RecoverySuggestion::RetryWithBackoff,
        },
        Case {
            error: classify(
                "ada",
                ProviderFailure::client(400, ProviderStatus::InvalidArgument, "bad request"),
            ),
            expected_category: ErrorCategory::Permanent,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: classify(
                "ada",
                ProviderFailure::client(403, ProviderStatus::PermissionDenied, "denied"),
            ),
            expected_category: ErrorCategory::Permanent,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckCredentials,
        },
        Case {
            error: classify(
                "ada",
                ProviderFailure::client(
                    400,
                    ProviderStatus::InvalidArgument,
                    "The input token count exceeds the maximum number of tokens allowed (1048576).",
                ),
            ),
            expected_category: ErrorCategory::ContextOverflow,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ReduceInputSize,
        },
        Case {
            error: ConnectorError::safety_block("ada", None),
            expected_category: ErrorCategory::SafetyBlock,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ReviewPrompt,
        },
        Case {
            error: classify("ada", ProviderFailure::decode("invalid JSON")),
            expected_category: ErrorCategory::Unknown,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: ConnectorError::Store(StoreError::Io(io_error)),
            expected_category: ErrorCategory::Storage,
            expected_retryable: false,
            expected_recovery: RecoverySuggestion::CheckStorage,
        },
    ];

    for case in cases {
        assert_eq!(
            case.error.category(),
            case.expected_category,
            "category for {}",
            case.error
        );
        assert_eq!(
            case.error.is_retryable(),
            case.expected_retryable,
            "retryable for {}",
            case.error
        );
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "recovery for {}",
            case.error
        );
    }
}

#[test]
fn classified_errors_keep_their_provider_failure() {
    let err = classify(
        "ada",
        ProviderFailure::client(401, ProviderStatus::Unauthenticated, "API key expired"),
    );
    let failure = err.provider_failure().expect("source failure");
    assert_eq!(failure.http_status, Some(401));
    assert_eq!(failure.status, Some(ProviderStatus::Unauthenticated));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn provider_status_parses_unknown_values() {
    assert_eq!(
        "RESOURCE_EXHAUSTED".parse::<ProviderStatus>().unwrap(),
        ProviderStatus::ResourceExhausted
    );
    assert_eq!(
        "SOMETHING_NEW".parse::<ProviderStatus>().unwrap(),
        ProviderStatus::Other("SOMETHING_NEW".to_string())
    );
}
