//! Errors raised by the bulk update HTTP client

use serde_json::Value;

/// Failure talking to the backend
#[derive(Debug)]
pub enum ApiError {
    /// Non-success status; `message` is what the operator should see
    Http { status: u16, message: String },
    /// Connection, TLS or body transfer failure
    Transport(reqwest::Error),
    /// Success status but the body did not have the expected shape
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http { message, .. } => write!(f, "{}", message),
            ApiError::Transport(e) => write!(f, "{}", e),
            ApiError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e)
        }
    }
}

impl ApiError {
    /// Build the error for a failed response from its status and raw body
    pub fn from_response_body(status: u16, body: &str) -> Self {
        ApiError::Http {
            status,
            message: error_message_from_body(status, body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pick the operator-facing message out of an error body.
///
/// Prefers `error`, then `message` (the token guard uses it), then a generic
/// status line.
pub fn error_message_from_body(status: u16, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("error")
                .and_then(Value::as_str)
                .or_else(|| v.get("message").and_then(Value::as_str))
        })
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins() {
        let body = r#"{"error": "Invalid table name", "message": "ignored"}"#;
        assert_eq!(error_message_from_body(400, body), "Invalid table name");
    }

    #[test]
    fn test_message_field_fallback() {
        let body = r#"{"message": "Token has expired! Please log in again."}"#;
        assert_eq!(
            error_message_from_body(401, body),
            "Token has expired! Please log in again."
        );
    }

    #[test]
    fn test_generic_status_for_non_json() {
        assert_eq!(
            error_message_from_body(502, "<html>Bad Gateway</html>"),
            "HTTP error! status: 502"
        );
        assert_eq!(error_message_from_body(500, r#"{"error": ""}"#), "HTTP error! status: 500");
    }

    #[test]
    fn test_display_is_verbatim_message() {
        let err = ApiError::from_response_body(400, r#"{"error": "No file part"}"#);
        assert_eq!(err.to_string(), "No file part");
        assert_eq!(err.status(), Some(400));
    }
}
