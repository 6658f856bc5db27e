//! Map markers for every sensor with coordinates.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use tracing::{debug, info};

use super::{current_snapshot, AppState};
use crate::pipeline::Dashboard;
use crate::presentation::map_view;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/map", get(handler))
}

async fn handler(State((cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    info!("GET /map");

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let dashboard = Dashboard::build(&snapshot, &config.breakpoints);
    let view = map_view(&dashboard.statuses);
    debug!(
        "GET /map - {} of {} sensors placed",
        view.points.len(),
        dashboard.statuses.len()
    );

    (StatusCode::OK, Json(view)).into_response()
}
