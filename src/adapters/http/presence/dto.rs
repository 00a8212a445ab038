//! HTTP DTOs for presence endpoints.

use serde::Serialize;

use crate::domain::foundation::{DomainError, PostId};

/// Liveness response, shaped as existing clients expect it.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "OK".to_string(),
            message: "Flux Blog API is running".to_string(),
        }
    }
}

/// Current viewer count of one post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerCountResponse {
    pub post_id: String,
    pub viewer_count: usize,
}

impl ViewerCountResponse {
    pub fn new(post_id: &PostId, viewer_count: usize) -> Self {
        Self {
            post_id: post_id.as_str().to_string(),
            viewer_count,
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(err: DomainError) -> Self {
        let details = if err.details.is_empty() {
            None
        } else {
            serde_json::to_value(&err.details).ok()
        };
        Self {
            code: err.code.to_string(),
            message: err.message,
            details,
        }
    }
}
