//! Token accounting for exchanges and sessions.

use crate::types::{TokenInfo, UsageMetadata};

use super::chat::ChatSession;

/// Build the [`TokenInfo`] for an exchange.
///
/// When the provider did not report a total, the session history is
/// recounted. A failed recount leaves the total unset; it never fails the
/// exchange.
pub async fn exchange_token_info(
    agent: &str,
    usage: Option<&UsageMetadata>,
    session: Option<&ChatSession>,
) -> TokenInfo {
    let mut info = TokenInfo::from_usage(usage);
    if info.total_tokens_in_session.is_some() {
        return info;
    }
    let Some(session) = session else {
        return info;
    };

    tracing::warn!(agent, "total_token_count not in usage metadata, recounting session tokens");
    match session.count_tokens().await {
        Ok(total) => info.total_tokens_in_session = Some(total),
        Err(failure) => tracing::warn!(
            agent,
            error = %failure,
            "could not count total session tokens after send"
        ),
    }
    info
}
