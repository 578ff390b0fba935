use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

use super::TransportError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Unauthorized - session has been cleared: {0}")]
    Unauthorized(String),

    #[error("Invalid login response")]
    InvalidLoginResponse,

    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Server error (status {status}): {body}")]
    Server { status: u16, body: String },

    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    fn body_text(body: &Value) -> String {
        match body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }

    /// Map a non-success response to an error. Only 401, 400 and 409 get
    /// their own variants; everything else keeps its status for the caller.
    pub fn from_status(status: StatusCode, body: &Value) -> Self {
        let truncated = Self::truncate_body(&Self::body_text(body));
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(truncated),
            StatusCode::BAD_REQUEST => ApiError::Validation(truncated),
            StatusCode::CONFLICT => ApiError::DuplicateAccount(truncated),
            _ => ApiError::Server {
                status: status.as_u16(),
                body: truncated,
            },
        }
    }

    /// HTTP status behind this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Validation(_) => Some(400),
            ApiError::DuplicateAccount(_) => Some(409),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
