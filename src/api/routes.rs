//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_clear_handler, cache_delete_handler, cache_get_handler, cache_set_handler,
    cache_stats_handler, health_handler, queue_complete_handler, queue_dequeue_handler,
    queue_enqueue_handler, queue_fail_handler, queue_stats_handler, system_stats_handler,
    telemetry_error_handler, telemetry_event_handler, telemetry_metric_handler,
    telemetry_stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/set` - Store a value under namespace+key
/// - `GET /cache/stats` - Cache statistics (optionally per namespace)
/// - `GET /cache/:namespace/:key` - Retrieve a value
/// - `DELETE /cache/:namespace/:key` - Delete a key
/// - `DELETE /cache/:namespace` - Clear a namespace
/// - `POST /queue/:name/enqueue` - Add an item
/// - `POST /queue/:name/dequeue` - Claim the next eligible item
/// - `POST /queue/:name/complete` - Acknowledge an in-progress item
/// - `POST /queue/:name/fail` - Report a processing failure
/// - `GET /queue/stats` - Queue statistics (optionally per queue)
/// - `POST /telemetry/metric` - Record a metric
/// - `POST /telemetry/event` - Record an event
/// - `POST /telemetry/error` - Record an error occurrence
/// - `GET /telemetry/stats` - Telemetry statistics
/// - `GET /stats` - Aggregated system statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/cache/set", put(cache_set_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route(
            "/cache/:namespace/:key",
            get(cache_get_handler).delete(cache_delete_handler),
        )
        .route("/cache/:namespace", delete(cache_clear_handler))
        .route("/queue/:name/enqueue", post(queue_enqueue_handler))
        .route("/queue/:name/dequeue", post(queue_dequeue_handler))
        .route("/queue/:name/complete", post(queue_complete_handler))
        .route("/queue/:name/fail", post(queue_fail_handler))
        .route("/queue/stats", get(queue_stats_handler))
        .route("/telemetry/metric", post(telemetry_metric_handler))
        .route("/telemetry/event", post(telemetry_event_handler))
        .route("/telemetry/error", post(telemetry_error_handler))
        .route("/telemetry/stats", get(telemetry_stats_handler))
        .route("/stats", get(system_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let state = AppState::from_config(&Config::default(), Arc::new(MemoryBackend::new()));
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cache_set_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/cache/set")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"namespace":"ns","key":"k","value":"hello"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cache_get_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/ns/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_queue_enqueue_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/queue/jobs/enqueue")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"payload":{"task":"index"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
