//! Location selector, per-sensor "right now" detail, and the trend chart
//! series.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{current_snapshot, not_found, AppState};
use crate::pipeline::Dashboard;
use crate::presentation::{sensor_options, trend_series, SensorDetail};
use crate::trend::window_hours;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/sensors", get(list))
        .route("/sensors/{sensor_id}", get(detail))
        .route("/sensors/{sensor_id}/trend", get(trend))
}

/// `GET /sensors`: sorted unique labels for the location picker.
async fn list(State((cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /sensors");

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let dashboard = Dashboard::build(&snapshot, &config.breakpoints);
    (StatusCode::OK, Json(sensor_options(&dashboard.statuses))).into_response()
}

/// `GET /sensors/{sensor_id}`: current status of one sensor.
async fn detail(
    Path(sensor_id): Path<String>,
    State((cache, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /sensors/{}", sensor_id);

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let dashboard = Dashboard::build(&snapshot, &config.breakpoints);
    match dashboard.status(&sensor_id) {
        Some(status) => (StatusCode::OK, Json(SensorDetail::from(status))).into_response(),
        None => not_found(format!("Unknown sensor '{}'", sensor_id)),
    }
}

/// Query parameters for the trend series
#[derive(Debug, Deserialize)]
pub struct TrendQuery {
    /// Overrides the configured window for this request.
    hours: Option<u32>,
}

/// `GET /sensors/{sensor_id}/trend`: time-ordered `{timestamp, pm25}` series.
async fn trend(
    Path(sensor_id): Path<String>,
    Query(params): Query<TrendQuery>,
    State((cache, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /sensors/{}/trend - {:?}", sensor_id, params);

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let sensor_id = sensor_id.trim();
    if !snapshot.readings.iter().any(|r| r.sensor_id == sensor_id) {
        return not_found(format!("Unknown sensor '{}'", sensor_id));
    }

    let hours = params.hours.unwrap_or(config.trend_window_hours);
    let series = trend_series(&snapshot.readings, sensor_id, window_hours(hours));
    debug!("GET /sensors/{}/trend - {} points", sensor_id, series.len());

    (StatusCode::OK, Json(series)).into_response()
}
