//! HTTP handlers for presence endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::presence::PresenceHub;
use crate::domain::foundation::{DomainError, PostId};

use super::dto::{ErrorResponse, HealthResponse, ViewerCountResponse};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct PresenceAppState {
    hub: PresenceHub,
}

impl PresenceAppState {
    pub fn new(hub: PresenceHub) -> Self {
        Self { hub }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/health - Liveness check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// GET /api/posts/:post_id/viewers - Current viewer count of a post
pub async fn get_viewer_count(
    State(state): State<PresenceAppState>,
    Path(post_id): Path<String>,
) -> Response {
    let post_id = match PostId::new(post_id) {
        Ok(id) => id,
        Err(e) => {
            let body = ErrorResponse::from(DomainError::from(e));
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let viewer_count = state.hub.viewer_count(&post_id).await;
    (
        StatusCode::OK,
        Json(ViewerCountResponse::new(&post_id, viewer_count)),
    )
        .into_response()
}
