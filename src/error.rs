// HTTP client error types
use serde_json::Value;

/// Failure talking to the school backend.
///
/// Status-bearing variants mirror what the server answered; the rest are
/// local (transport, undecodable body, bad configuration).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // 400 Bad Request
    #[error("Bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // 403 Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    // 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    // any other non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response body: {0}")]
    InvalidResponse(String),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// Build from a non-success status and whatever body the server sent
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

        match status {
            400 => ClientError::BadRequest(message),
            401 => ClientError::Unauthorized(message),
            403 => ClientError::Forbidden(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::Server { status, message },
        }
    }

    /// HTTP status code, when the server produced one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::BadRequest(_) => Some(400),
            ClientError::Unauthorized(_) => Some(401),
            ClientError::Forbidden(_) => Some(403),
            ClientError::NotFound(_) => Some(404),
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            ClientError::InvalidResponse(_) | ClientError::InvalidUrl(_) => None,
        }
    }

    /// Get error code for output handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::BadRequest(_) => "BAD_REQUEST",
            ClientError::Unauthorized(_) => "UNAUTHORIZED",
            ClientError::Forbidden(_) => "FORBIDDEN",
            ClientError::NotFound(_) => "NOT_FOUND",
            ClientError::Server { .. } => "SERVER_ERROR",
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::InvalidResponse(_) => "INVALID_RESPONSE",
            ClientError::InvalidUrl(_) => "INVALID_URL",
        }
    }
}

// Backends answer errors as {"message": ...} or {"error": ...}
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}
