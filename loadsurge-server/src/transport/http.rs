//! HTTP/JSON surface over the engine
//!
//! Thin by design: handlers clamp and validate input, call the engine, and
//! serialize snapshots. All load-test semantics live below this layer.
//!
//! # API Endpoints
//!
//! ## POST /tests
//!
//! Start a load test. Returns 202 with the generated test id.
//!
//! ```json
//! {
//!   "targetUrl": "https://example.com/api",
//!   "method": "GET",
//!   "concurrentUsers": 10,
//!   "durationSeconds": 30,
//!   "requestTimeoutMs": 5000,
//!   "thresholds": {"maxErrorRatePercent": 10},
//!   "pattern": {"type": "ramp_up", "rampUpSeconds": 10}
//! }
//! ```
//!
//! ## GET /tests/{id}
//!
//! Status snapshot of a running or completed test.
//!
//! ## GET /history, GET /history/{id}
//!
//! Completed tests, most recent first. `/history?ids=a,b` filters to the
//! given ids, preserving history order.
//!
//! ## GET /patterns/preview
//!
//! Sample a load pattern's concurrency curve without running anything, e.g.
//! `/patterns/preview?type=spike&durationSeconds=60&concurrentUsers=5&spikeConcurrency=20&spikeDurationSeconds=10`.
//!
//! ## GET /health
//!
//! Health check endpoint. Returns "OK" with 200 status.

use super::Transport;
use crate::engine::Engine;
use crate::types::StatusSnapshot;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use loadsurge::core::config::{
    MAX_CONCURRENT_USERS, MAX_DURATION_SECONDS, MIN_CONCURRENT_USERS, MIN_DURATION_SECONDS,
};
use loadsurge::{LoadPattern, PreviewPoint, TestConfig, pattern_preview};

/// Response to a successful test start.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub test_id: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Query string for `/history`.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// Comma-separated ids to filter by.
    pub ids: Option<String>,
}

/// Query string for `/patterns/preview`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewQuery {
    #[serde(rename = "type")]
    pub pattern_type: Option<String>,
    pub duration_seconds: u64,
    pub concurrent_users: u32,
    pub target_rps: Option<u32>,
    pub ramp_up_seconds: Option<u64>,
    pub spike_concurrency: Option<u32>,
    pub spike_duration_seconds: Option<u64>,
}

/// HTTP transport implementation.
pub struct HttpTransport {
    addr: SocketAddr,
}

impl HttpTransport {
    pub fn new(host: &str, port: u16) -> Self {
        let addr = format!("{host}:{port}").parse().expect("Invalid address");
        Self { addr }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn start(self, engine: Engine) -> Result<()> {
        let app = router(engine);

        tracing::info!("HTTP server listening on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

struct AppState {
    engine: Engine,
}

pub(crate) fn router(engine: Engine) -> Router {
    let app_state = Arc::new(AppState { engine });

    Router::new()
        .route("/tests", post(handle_start_test))
        .route("/tests/{id}", get(handle_get_test))
        .route("/history", get(handle_get_history))
        .route("/history/{id}", get(handle_get_history_record))
        .route("/patterns/preview", get(handle_pattern_preview))
        .route("/health", get(|| async { "OK" }))
        .with_state(app_state)
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn not_found(id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Unknown test id: {id}"),
        }),
    )
}

/// Reject anything that is not an absolute http/https URL. Deeper safety
/// filtering (localhost and private-IP blocking) runs upstream of this
/// service.
fn validate_target_url(raw: &str) -> Result<(), String> {
    let url = reqwest::Url::parse(raw).map_err(|e| format!("Invalid target URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported URL scheme: {other}")),
    }
}

async fn handle_start_test(
    State(state): State<Arc<AppState>>,
    Json(config): Json<TestConfig>,
) -> Result<(StatusCode, Json<StartResponse>), (StatusCode, Json<ErrorResponse>)> {
    validate_target_url(&config.target_url).map_err(bad_request)?;

    let test_id = state.engine.start_load_test(config);
    Ok((StatusCode::ACCEPTED, Json(StartResponse { test_id })))
}

async fn handle_get_test(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.get_test(&id).await {
        Some(test) => Ok(Json(StatusSnapshot::from(&test))),
        None => Err(not_found(&id)),
    }
}

async fn handle_get_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<crate::types::HistoryRecord>> {
    let records = match query.ids {
        Some(ids) => {
            let ids: Vec<String> = ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            state.engine.get_history_records(&ids)
        }
        None => state.engine.get_history(),
    };
    Json(records)
}

async fn handle_get_history_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<crate::types::HistoryRecord>, (StatusCode, Json<ErrorResponse>)> {
    match state.engine.get_history_record(&id) {
        Some(record) => Ok(Json(record)),
        None => Err(not_found(&id)),
    }
}

async fn handle_pattern_preview(
    Query(query): Query<PreviewQuery>,
) -> Result<Json<Vec<PreviewPoint>>, (StatusCode, Json<ErrorResponse>)> {
    let pattern = pattern_from_query(&query).map_err(bad_request)?;
    let duration = query
        .duration_seconds
        .clamp(MIN_DURATION_SECONDS, MAX_DURATION_SECONDS);
    let users = query
        .concurrent_users
        .clamp(MIN_CONCURRENT_USERS, MAX_CONCURRENT_USERS);

    Ok(Json(pattern_preview(pattern.as_ref(), duration, users)))
}

fn pattern_from_query(query: &PreviewQuery) -> Result<Option<LoadPattern>, String> {
    let pattern = match query.pattern_type.as_deref() {
        None | Some("fixed_concurrency") => None,
        Some("fixed_rps") => Some(LoadPattern::FixedRps {
            target_rps: query.target_rps.unwrap_or(1).max(1),
        }),
        Some("ramp_up") => Some(LoadPattern::RampUp {
            ramp_up_seconds: query
                .ramp_up_seconds
                .ok_or("ramp_up requires rampUpSeconds")?,
        }),
        Some("spike") => Some(LoadPattern::Spike {
            spike_concurrency: query
                .spike_concurrency
                .ok_or("spike requires spikeConcurrency")?,
            spike_duration_seconds: query
                .spike_duration_seconds
                .ok_or("spike requires spikeDurationSeconds")?,
        }),
        Some(other) => return Err(format!("Unknown pattern type: {other}")),
    };
    Ok(pattern)
}
