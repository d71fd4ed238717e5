//! HTTP helpers: SSE parsing and error-body translation.

use serde::Deserialize;

use crate::error::{FailureKind, ProviderFailure, ProviderStatus};

/// Parse an SSE "data:" line, returning None for "[DONE]".
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line
        .strip_prefix("data: ")
        .or_else(|| line.strip_prefix("data:"))?;
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Splits a byte stream into SSE lines.
///
/// Bytes are buffered until a full line has arrived, so a multi-byte
/// character split across network chunks is decoded intact.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        let end = self.pending.iter().position(|&byte| byte == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(decode_line(&line))
    }

    /// Whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<Result<String, std::str::Utf8Error>> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, std::str::Utf8Error> {
    std::str::from_utf8(bytes).map(|line| line.trim().to_string())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

/// Translate a non-success HTTP response into a [`ProviderFailure`].
///
/// Google error bodies look like
/// `{"error": {"code": 400, "message": "...", "status": "INVALID_ARGUMENT"}}`;
/// anything else is kept verbatim as the message.
pub fn failure_from_status(http_status: u16, body: &str) -> ProviderFailure {
    let kind = match http_status {
        400..=499 => FailureKind::Client,
        500..=599 => FailureKind::Server,
        _ => FailureKind::Other,
    };

    let mut failure = ProviderFailure::new(kind, body.trim());
    failure.http_status = Some(http_status);

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let error = envelope.error;
        if let Some(message) = error.message {
            failure.message = message;
        }
        failure.status = error.status.and_then(|status| status.parse::<ProviderStatus>().ok());
        failure.details = error.details;
        if let Some(code) = error.code.filter(|&code| code != http_status) {
            tracing::debug!(http_status, body_code = code, "error body code differs from HTTP status");
        }
    }
    if failure.message.is_empty() {
        failure.message = format!("HTTP {http_status}");
    }
    failure
}

/// Translate a transport-level error.
pub fn failure_from_reqwest(error: reqwest::Error) -> ProviderFailure {
    if error.is_timeout() || error.is_connect() || error.is_request() || error.is_body() {
        ProviderFailure::transport(error.to_string())
    } else if error.is_decode() {
        ProviderFailure::decode(error.to_string())
    } else {
        ProviderFailure::new(FailureKind::Other, error.to_string())
    }
}
