//! Ranked hotspot and improvement table.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, routing::get, Json,
    Router,
};
use serde::Deserialize;
use tracing::info;

use super::{current_snapshot, AppState};
use crate::pipeline::Dashboard;
use crate::presentation::hotspot_table;
use crate::rank::RankOrder;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/hotspots", get(handler))
}

/// Query parameters for the hotspot table
#[derive(Debug, Deserialize)]
pub struct HotspotQuery {
    /// `highest` (default) or `improvement`
    order: Option<RankOrder>,
    limit: Option<usize>,
}

async fn handler(
    Query(params): Query<HotspotQuery>,
    State((cache, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    info!("GET /hotspots - {:?}", params);

    let snapshot = match current_snapshot(&cache).await {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let dashboard = Dashboard::build(&snapshot, &config.breakpoints);
    let rows = hotspot_table(
        &dashboard.statuses,
        params.order.unwrap_or_default(),
        params.limit.unwrap_or(config.hotspot_limit),
    );

    (StatusCode::OK, Json(rows)).into_response()
}
