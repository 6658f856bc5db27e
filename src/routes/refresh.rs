//! Explicit refresh: drop the cached snapshot and re-fetch both inputs.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::{refreshed_snapshot, AppState};

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/refresh", post(handler))
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    readings: usize,
    sites: usize,
    loaded_at: DateTime<Utc>,
}

async fn handler(State((cache, _)): State<AppState>) -> impl IntoResponse {
    // ---
    info!("POST /refresh - reloading snapshot");

    let snapshot = match refreshed_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    info!(
        "Refresh complete: {} readings, {} sites",
        snapshot.readings.len(),
        snapshot.sites.len()
    );
    let body = RefreshResponse {
        readings: snapshot.readings.len(),
        sites: snapshot.sites.len(),
        loaded_at: snapshot.loaded_at,
    };
    (StatusCode::OK, Json(body)).into_response()
}
