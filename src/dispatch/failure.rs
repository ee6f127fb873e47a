//! Tagged dispatch failures and their chat rendering.

use crate::error::TransportError;

/// Token every failure chat text starts with.
pub const FAILURE_MARKER: &str = "SmartTA error";

/// Longest backend error body quoted back to the user.
const MAX_DETAIL_CHARS: usize = 300;

/// Result of one dispatch call.
pub type DispatchOutcome = Result<String, DispatchFailure>;

/// Which stage of a dispatch call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, DNS failure, timeout.
    Network,
    /// Non-2xx response.
    HttpStatus(u16),
    /// Body was not JSON or lacked the expected field.
    Decode,
    /// Failed before the request was sent.
    Preflight,
    /// Well-formed response in which the backend reported an error.
    Rejected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::HttpStatus(code) => write!(f, "http {code}"),
            Self::Decode => write!(f, "decode"),
            Self::Preflight => write!(f, "preflight"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A failed dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} failure: {detail}")]
pub struct DispatchFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl DispatchFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, detail)
    }

    pub fn decode(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Decode, detail)
    }

    pub fn preflight(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Preflight, detail)
    }

    pub fn rejected(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Rejected, detail)
    }

    /// User-facing text, always prefixed with [`FAILURE_MARKER`].
    pub fn to_chat_text(&self) -> String {
        let headline = match self.kind {
            FailureKind::Network => "request failed".to_string(),
            FailureKind::HttpStatus(code) => format!("server returned HTTP {code}"),
            FailureKind::Decode => "failed to parse response".to_string(),
            FailureKind::Preflight => "unexpected error".to_string(),
            FailureKind::Rejected => "backend reported an error".to_string(),
        };
        if self.detail.is_empty() {
            format!("{FAILURE_MARKER}: {headline}")
        } else {
            format!("{FAILURE_MARKER}: {headline} ({})", self.detail)
        }
    }
}

impl From<TransportError> for DispatchFailure {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { code, ref body, .. } => {
                Self::new(FailureKind::HttpStatus(code), status_detail(body))
            }
            TransportError::Network { .. }
            | TransportError::Timeout { .. }
            | TransportError::Body { .. } => Self::network(err.to_string()),
            TransportError::ClientBuild(_) | TransportError::Codec(_) => {
                Self::preflight(err.to_string())
            }
        }
    }
}

/// Pull the backend's own `error` message out of an error body if it has one.
fn status_detail(body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    truncate_chars(&detail, MAX_DETAIL_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Whether a chat text was produced by [`DispatchFailure::to_chat_text`].
pub fn is_failure_text(text: &str) -> bool {
    text.trim_start().starts_with(FAILURE_MARKER)
}

/// Render an outcome as chat text, success or failure.
pub fn outcome_text(outcome: &DispatchOutcome) -> String {
    match outcome {
        Ok(text) => text.clone(),
        Err(failure) => failure.to_chat_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failure_embeds_code() {
        let failure = DispatchFailure::new(FailureKind::HttpStatus(500), "");
        let text = failure.to_chat_text();
        assert!(text.contains("500"));
        assert!(is_failure_text(&text));
    }

    #[test]
    fn every_kind_carries_the_marker() {
        for kind in [
            FailureKind::Network,
            FailureKind::HttpStatus(404),
            FailureKind::Decode,
            FailureKind::Preflight,
            FailureKind::Rejected,
        ] {
            assert!(is_failure_text(&DispatchFailure::new(kind, "x").to_chat_text()));
        }
    }

    #[test]
    fn plain_answers_are_not_failures() {
        assert!(!is_failure_text("It declares x."));
        assert_eq!(outcome_text(&Ok("fine".into())), "fine");
    }

    #[test]
    fn status_detail_prefers_backend_error_field() {
        assert_eq!(
            status_detail(r#"{"error":"测试需求和代码上下文不能为空"}"#),
            "测试需求和代码上下文不能为空"
        );
        assert_eq!(status_detail("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn long_detail_is_truncated_on_char_boundary() {
        let body = "错".repeat(MAX_DETAIL_CHARS + 10);
        let detail = status_detail(&body);
        assert_eq!(detail.chars().count(), MAX_DETAIL_CHARS + 1);
        assert!(detail.ends_with('…'));
    }

    #[test]
    fn transport_status_maps_to_http_kind() {
        let err = TransportError::Status {
            url: "http://x/ask".into(),
            code: 503,
            body: String::new(),
        };
        assert_eq!(DispatchFailure::from(err).kind, FailureKind::HttpStatus(503));
    }
}
