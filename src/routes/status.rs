//! Area-wide banners and the category color guide.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tracing::{debug, info};

use super::{current_snapshot, AppState};
use crate::pipeline::Dashboard;
use crate::presentation::{legend, status_banners};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/status", get(status))
        .route("/legend", get(color_guide))
}

/// `GET /status`: overall category and average plus the ranking highlights.
async fn status(State((cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /status");

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let dashboard = Dashboard::build(&snapshot, &config.breakpoints);
    let banners = status_banners(&dashboard, snapshot.loaded_at);
    debug!("GET /status - {}", banners.area.message);

    (StatusCode::OK, Json(banners)).into_response()
}

/// `GET /legend`: every category with its color, advice and range.
async fn color_guide(State((_, config)): State<AppState>) -> impl IntoResponse {
    Json(legend(&config.breakpoints))
}
