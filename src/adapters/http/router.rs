//! Application router: JSON routes, the live channel and shared layers.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::adapters::presence::PresenceHub;
use crate::adapters::websocket::{websocket_router, LiveState};
use crate::config::ServerConfig;

use super::presence::{presence_routes, PresenceAppState};

/// Build the full application router.
///
/// The request timeout wraps the JSON routes only; a websocket upgrade
/// outlives any request deadline.
pub fn build_router(hub: PresenceHub, server: &ServerConfig) -> Router {
    let api = presence_routes(PresenceAppState::new(hub.clone())).layer(TimeoutLayer::new(
        Duration::from_secs(server.request_timeout_secs),
    ));

    let live = Router::new().nest("/api", websocket_router().with_state(LiveState::new(hub)));

    Router::new()
        .merge(api)
        .merge(live)
        .layer(cors_layer(&server.cors_origins_list()))
        .layer(TraceLayer::new_for_http())
}

/// CORS restricted to the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_served_through_full_stack() {
        let router = build_router(PresenceHub::default(), &ServerConfig::default());

        let response = router
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn allowed_origin_is_echoed() {
        let router = build_router(PresenceHub::default(), &ServerConfig::default());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn foreign_origin_is_not_allowed() {
        let router = build_router(PresenceHub::default(), &ServerConfig::default());

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .header(header::ORIGIN, "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn live_route_requires_upgrade() {
        let router = build_router(PresenceHub::default(), &ServerConfig::default());

        let response = router
            .oneshot(Request::builder().uri("/api/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
