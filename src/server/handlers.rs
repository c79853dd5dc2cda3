use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::location::{AccuracyStats, LocationOptions, LocationRecord};

use super::state::AppState;

/// Longest device timeout a client may ask for.
const MAX_TIMEOUT_MILLIS: u64 = 60_000;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

// ─── GET /api/location ───────────────────────────────────────────

pub(super) async fn location(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LocationOptions>, QueryRejection>,
) -> Result<Json<LocationRecord>, ApiError> {
    let Query(options) = query.map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
    if options.timeout_millis > MAX_TIMEOUT_MILLIS {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("timeout_millis must be at most {}", MAX_TIMEOUT_MILLIS),
        ));
    }

    let start = Instant::now();
    let record = state.service.get_location(&options).await;

    info!(
        source = %record.source(),
        cached = record.served_from_cache(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "GET /api/location"
    );
    Ok(Json(record))
}

// ─── GET /api/location/stats ─────────────────────────────────────

pub(super) async fn stats(State(state): State<Arc<AppState>>) -> Json<AccuracyStats> {
    Json(state.service.accuracy_stats())
}

// ─── DELETE /api/location/cache ──────────────────────────────────

pub(super) async fn invalidate(State(state): State<Arc<AppState>>) -> StatusCode {
    state.service.invalidate();
    info!("DELETE /api/location/cache");
    StatusCode::NO_CONTENT
}
