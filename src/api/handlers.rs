//! API Handlers
//!
//! HTTP request handlers for each service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::backend::Backend;
use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{
    AckResponse, CacheClearResponse, CacheDeleteResponse, CacheGetResponse, CacheSetRequest,
    CacheSetResponse, CacheStatsQuery, CompleteRequest, CompleteResponse, EnqueueRequest,
    EnqueueResponse, ErrorRequest, EventRequest, FailRequest, FailResponse, HealthResponse,
    MetricRequest, QueueStatsQuery,
};
use crate::queue::{QueueConfig, QueueItem, QueueManager, QueueStats};
use crate::stats::{StatsAggregator, SystemStats};
use crate::telemetry::{LogSink, TelemetryCollector, TelemetryConfig, TelemetryStats};

// == App State ==
/// Application state shared across all handlers.
///
/// Every service is an explicit instance constructed once at startup and
/// shared by reference; there is no ambient global state.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
    pub queue: Arc<QueueManager>,
    pub telemetry: Arc<TelemetryCollector>,
    pub aggregator: Arc<StatsAggregator>,
}

impl AppState {
    /// Creates a new AppState from already-constructed services.
    pub fn new(
        cache: Arc<CacheStore>,
        queue: Arc<QueueManager>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        let aggregator = Arc::new(StatsAggregator::new(
            cache.clone(),
            queue.clone(),
            telemetry.clone(),
        ));
        Self {
            cache,
            queue,
            telemetry,
            aggregator,
        }
    }

    /// Creates a new AppState from configuration and a backend.
    ///
    /// The backend is passed in separately so the caller controls the
    /// connect step before the state is put into service.
    pub fn from_config(config: &Config, backend: Arc<dyn Backend>) -> Self {
        let cache = Arc::new(CacheStore::new(
            backend,
            config.cache_capacity,
            config.default_ttl,
        ));
        let queue = Arc::new(QueueManager::new(QueueConfig::from_config(config)));
        let telemetry = Arc::new(TelemetryCollector::new(
            Arc::new(LogSink::new()),
            TelemetryConfig::from_config(config),
        ));
        Self::new(cache, queue, telemetry)
    }
}

// == Cache Handlers ==

/// Handler for PUT /cache/set
pub async fn cache_set_handler(
    State(state): State<AppState>,
    Json(req): Json<CacheSetRequest>,
) -> Result<Json<CacheSetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    state
        .cache
        .set(&req.namespace, &req.key, req.value, req.ttl)
        .await?;

    Ok(Json(CacheSetResponse::new(req.namespace, req.key)))
}

/// Handler for GET /cache/:namespace/:key
///
/// A missing or expired key maps to 404; the store itself never treats
/// absence as an error.
pub async fn cache_get_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<CacheGetResponse>> {
    match state.cache.get(&namespace, &key).await? {
        Some(value) => Ok(Json(CacheGetResponse::new(namespace, key, value))),
        None => Err(ServiceError::NotFound(format!(
            "Key not found: {}/{}",
            namespace, key
        ))),
    }
}

/// Handler for DELETE /cache/:namespace/:key
pub async fn cache_delete_handler(
    State(state): State<AppState>,
    Path((namespace, key)): Path<(String, String)>,
) -> Result<Json<CacheDeleteResponse>> {
    let deleted = state.cache.delete(&namespace, &key).await?;
    Ok(Json(CacheDeleteResponse::new(key, deleted)))
}

/// Handler for DELETE /cache/:namespace
pub async fn cache_clear_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<CacheClearResponse>> {
    let cleared = state.cache.clear(&namespace).await?;
    Ok(Json(CacheClearResponse::new(namespace, cleared)))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<CacheStatsQuery>,
) -> Json<CacheStats> {
    Json(state.cache.stats(query.namespace.as_deref()).await)
}

// == Queue Handlers ==

/// Handler for POST /queue/:name/enqueue
pub async fn queue_enqueue_handler(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    Json(req): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    let id = state
        .queue
        .enqueue(&queue_name, req.payload, req.priority, req.max_attempts)
        .await?;

    Ok(Json(EnqueueResponse::new(queue_name, id)))
}

/// Handler for POST /queue/:name/dequeue
///
/// An empty queue maps to 404; consumers poll until an item is available.
pub async fn queue_dequeue_handler(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
) -> Result<Json<QueueItem>> {
    match state.queue.dequeue(&queue_name).await {
        Some(item) => Ok(Json(item)),
        None => Err(ServiceError::NotFound(format!(
            "No eligible items on queue '{}'",
            queue_name
        ))),
    }
}

/// Handler for POST /queue/:name/complete
pub async fn queue_complete_handler(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>> {
    state.queue.complete(&queue_name, req.id).await?;
    Ok(Json(CompleteResponse::new(req.id)))
}

/// Handler for POST /queue/:name/fail
pub async fn queue_fail_handler(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
    Json(req): Json<FailRequest>,
) -> Result<Json<FailResponse>> {
    let status = state.queue.fail(&queue_name, req.id, &req.error).await?;
    Ok(Json(FailResponse::new(req.id, status)))
}

/// Handler for GET /queue/stats
pub async fn queue_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<QueueStatsQuery>,
) -> Json<QueueStats> {
    Json(state.queue.stats(query.queue.as_deref()).await)
}

// == Telemetry Handlers ==

/// Handler for POST /telemetry/metric
pub async fn telemetry_metric_handler(
    State(state): State<AppState>,
    Json(req): Json<MetricRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    state
        .telemetry
        .record_metric(&req.name, req.value, req.tags)
        .await;

    Ok(Json(AckResponse::recorded("Metric", &req.name)))
}

/// Handler for POST /telemetry/event
pub async fn telemetry_event_handler(
    State(state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    state
        .telemetry
        .record_event(&req.name, req.properties, req.level)
        .await;

    Ok(Json(AckResponse::recorded("Event", &req.name)))
}

/// Handler for POST /telemetry/error
pub async fn telemetry_error_handler(
    State(state): State<AppState>,
    Json(req): Json<ErrorRequest>,
) -> Result<Json<AckResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ServiceError::InvalidRequest(error_msg));
    }

    state
        .telemetry
        .record_error(&req.name, &req.error, req.context)
        .await;

    Ok(Json(AckResponse::recorded("Error", &req.name)))
}

/// Handler for GET /telemetry/stats
pub async fn telemetry_stats_handler(State(state): State<AppState>) -> Json<TelemetryStats> {
    Json(state.telemetry.stats().await)
}

// == Monitoring Handlers ==

/// Handler for GET /stats
///
/// Aggregated snapshot across cache, queues, and telemetry.
pub async fn system_stats_handler(State(state): State<AppState>) -> Json<SystemStats> {
    Json(state.aggregator.snapshot().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
