use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failures surfaced by [`super::ApiClient`] and the feature clients built on it.
///
/// Callers match on the variant instead of inspecting error types at runtime.
#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Not found")]
    NotFound { body: Value },

    /// Any other non-success response; `body` is the raw server payload.
    #[error("{message}")]
    Request {
        status: StatusCode,
        message: String,
        body: Value,
    },

    /// A rejected password reset code, with the attempts the server still allows.
    #[error("{message}")]
    VerifyCode {
        status: StatusCode,
        message: String,
        attempts_remaining: u32,
    },

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Unable to reach the server: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Failed to encode request: {0}")]
    Encode(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl ApiError {
    /// Classifies a non-success response: `404` becomes `NotFound`, anything
    /// else a `Request` error carrying the parsed body.
    pub(crate) fn from_response(status: StatusCode, raw: &[u8]) -> Self {
        let body = parse_body(raw);
        if status == StatusCode::NOT_FOUND {
            return Self::NotFound { body };
        }
        let message = error_message(&body)
            .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
        Self::Request {
            status,
            message,
            body,
        }
    }

    /// HTTP status attached to the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Request { status, .. } | Self::VerifyCode { status, .. } => Some(*status),
            Self::Timeout
            | Self::Network(_)
            | Self::Decode(_)
            | Self::Encode(_)
            | Self::Config(_) => None,
        }
    }

    /// Message shown to the user; `fallback` covers errors without a useful text.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

/// Non-JSON bodies are kept as a JSON string so nothing the server said is lost.
fn parse_body(raw: &[u8]) -> Value {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).trim().to_string()))
}

fn error_message(body: &Value) -> Option<String> {
    ["detail", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_error_prefers_detail_field() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            br#"{"detail": "Invalid code", "attempts_remaining": 2}"#,
        );
        assert_eq!(err.to_string(), "Invalid code");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        match err {
            ApiError::Request { body, .. } => assert_eq!(body["attempts_remaining"], json!(2)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn not_found_is_its_own_kind() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, br#"{"detail": "gone"}"#);
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn request_error_falls_back_to_status() {
        let err = ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, b"");
        assert_eq!(err.to_string(), "Request failed (500)");
        match err {
            ApiError::Request { body, .. } => assert_eq!(body, Value::Null),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_is_preserved() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, b" upstream down \n");
        match err {
            ApiError::Request { body, message, .. } => {
                assert_eq!(body, json!("upstream down"));
                assert_eq!(message, "Request failed (502)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn user_message_uses_fallback_for_blank_messages() {
        let err = ApiError::VerifyCode {
            status: StatusCode::BAD_REQUEST,
            message: "  ".to_string(),
            attempts_remaining: 1,
        };
        assert_eq!(err.user_message("Verification failed"), "Verification failed");
        assert_eq!(
            ApiError::Timeout.user_message("Login failed"),
            "Request timed out. Please try again."
        );
    }
}
