//! Route gateway: merges every endpoint subrouter and attaches shared state.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::store::{Snapshot, SnapshotCache};
use crate::Config;

mod health;
mod hotspots;
mod map;
mod refresh;
mod sensors;
mod status;

// ---

/// State shared by all handlers.
pub type AppState = (Arc<SnapshotCache>, Config);

pub fn router(cache: Arc<SnapshotCache>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(status::router())
        .merge(sensors::router())
        .merge(map::router())
        .merge(hotspots::router())
        .merge(refresh::router())
        .merge(health::router())
        .with_state((cache, config))
}

// ---

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

fn error_response(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    // ---
    let body = ErrorBody {
        code,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn not_found(what: impl Into<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, "NOT_FOUND", what)
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        // ---
        tracing::error!("Pipeline failure: {}", self);
        let code = match self {
            PipelineError::Configuration(_) => "CONFIGURATION_ERROR",
            PipelineError::Load { .. } => "LOAD_ERROR",
        };
        error_response(StatusCode::INTERNAL_SERVER_ERROR, code, self.to_string())
    }
}

/// Fetch the cached snapshot, loading it off the async runtime when needed.
async fn current_snapshot(cache: &Arc<SnapshotCache>) -> Result<Arc<Snapshot>, Response> {
    with_cache(cache, SnapshotCache::get).await
}

/// Drop the cached snapshot and reload it, off the async runtime.
async fn refreshed_snapshot(cache: &Arc<SnapshotCache>) -> Result<Arc<Snapshot>, Response> {
    with_cache(cache, SnapshotCache::refresh).await
}

/// Run a cache operation on the blocking pool. Cache calls may wait on the
/// cache lock while another task loads from disk, so they never run on a
/// runtime worker.
async fn with_cache(
    cache: &Arc<SnapshotCache>,
    op: fn(&SnapshotCache) -> PipelineResult<Arc<Snapshot>>,
) -> Result<Arc<Snapshot>, Response> {
    // ---
    let cache = Arc::clone(cache);
    match tokio::task::spawn_blocking(move || op(&cache)).await {
        Ok(Ok(snapshot)) => Ok(snapshot),
        Ok(Err(e)) => Err(e.into_response()),
        Err(e) => {
            tracing::error!("Snapshot load task failed: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Failed to load data",
            ))
        }
    }
}
