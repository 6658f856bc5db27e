use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use airwatch::store::{ReadingSource, SiteSource};
use airwatch::{
    routes, Config, CsvReadingStore, CsvSiteDirectory, PipelineResult, RawReading, SiteInfo,
    SnapshotCache,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const READINGS: &str = "\
sn,timestamp_local,pm25,geo
A1,2024-01-01 08:00:00,10,\"{'lat': 42.39, 'lon': -71.03}\"
A1,2024-01-01 09:00:00,40,\"{'lat': 42.39, 'lon': -71.03}\"
B2,2024-01-01 09:30:00,5,\"{'lat': 42.40, 'lon': -71.04}\"
B2,2024-01-01 10:30:00,3,not-a-map
C3,2023-12-30 09:00:00,80,\"{'lat': 42.41, 'lon': -71.05}\"
C3,2024-01-01 09:00:00,bad,\"{'lat': 42.41, 'lon': -71.05}\"
";

const SITES: &str = "\
ID,Location Description
A1,Library
 C3 ,City Hall
";

fn app_with(dir: &TempDir) -> Router {
    // ---
    let readings = dir.path().join("sensor_data.csv");
    let sites = dir.path().join("sites.csv");
    let cfg = Config::new(&readings, &sites);

    let cache = Arc::new(SnapshotCache::new(
        CsvReadingStore::new(&readings),
        CsvSiteDirectory::new(&sites),
    ));
    routes::router(cache, cfg)
}

fn fixture() -> (TempDir, Router) {
    // ---
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sensor_data.csv"), READINGS).unwrap();
    std::fs::write(dir.path().join("sites.csv"), SITES).unwrap();
    let app = app_with(&dir);
    (dir, app)
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    // ---
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri).await
}

fn append(path: &Path, line: &str) {
    let mut content = std::fs::read_to_string(path).unwrap();
    content.push_str(line);
    std::fs::write(path, content).unwrap();
}

#[tokio::test]
async fn health_is_ok() {
    // ---
    let (_dir, app) = fixture();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn status_reports_area_and_highlights() {
    // ---
    let (_dir, app) = fixture();
    let (status, body) = get(&app, "/status").await;

    assert_eq!(status, StatusCode::OK);
    // Latest values: A1 = 40, B2 = 3, C3 = no data
    assert_eq!(body["area"]["average_pm25"], 21.5);
    assert_eq!(body["area"]["category"], "Moderate");
    assert_eq!(body["sensor_count"], 3);
    assert_eq!(body["highest"]["label"], "Library");
    assert_eq!(body["improvement"]["sensor_id"], "B2");
    assert_eq!(body["improvement"]["change_since_last"], -2.0);
}

#[tokio::test]
async fn map_excludes_sensor_without_coordinates() {
    // ---
    let (_dir, app) = fixture();
    let (status, body) = get(&app, "/map").await;

    assert_eq!(status, StatusCode::OK);
    let points = body["points"].as_array().unwrap();
    let labels: Vec<&str> = points.iter().map(|p| p["label"].as_str().unwrap()).collect();
    assert_eq!(labels, vec!["Library", "City Hall"]);
    assert_eq!(points[0]["radius"], 400.0);
    assert_eq!(points[1]["radius"], 10.0);
    assert_eq!(points[1]["category"], "NoData");
    assert_eq!(body["zoom"], 13);
}

#[tokio::test]
async fn hotspots_rank_both_ways() {
    // ---
    let (_dir, app) = fixture();

    let (_, body) = get(&app, "/hotspots?limit=2").await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sensor_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["A1", "B2"]);

    let (_, body) = get(&app, "/hotspots?order=improvement").await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["sensor_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["B2", "C3", "A1"]);
}

#[tokio::test]
async fn sensors_list_and_detail() {
    // ---
    let (_dir, app) = fixture();

    let (_, body) = get(&app, "/sensors").await;
    let labels: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["B2", "City Hall", "Library"]);

    let (status, body) = get(&app, "/sensors/A1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Moderate");
    assert_eq!(body["change_since_last"], 30.0);
    assert_eq!(body["updated_display"], "09:00 AM");

    let (status, body) = get(&app, "/sensors/ZZ").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn trend_uses_sensor_window() {
    // ---
    let (_dir, app) = fixture();

    let (status, body) = get(&app, "/sensors/C3/trend").await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["timestamp"], "2024-01-01T09:00:00");
    assert!(points[0]["pm25"].is_null());

    let (_, body) = get(&app, "/sensors/C3/trend?hours=72").await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, _) = get(&app, "/sensors/ZZ/trend").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_discards_cached_snapshot() {
    // ---
    let (dir, app) = fixture();
    let (_, before) = get(&app, "/status").await;
    assert_eq!(before["area"]["average_pm25"], 21.5);

    append(
        &dir.path().join("sensor_data.csv"),
        "A1,2024-01-01 11:00:00,200,\"{'lat': 42.39, 'lon': -71.03}\"\n",
    );

    // Still served from cache
    let (_, cached) = get(&app, "/status").await;
    assert_eq!(cached["area"]["average_pm25"], 21.5);

    let (status, body) = send(&app, "POST", "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["readings"], 7);
    assert_eq!(body["sites"], 2);

    let (_, after) = get(&app, "/status").await;
    assert_eq!(after["area"]["average_pm25"], 101.5);
    assert_eq!(after["area"]["category"], "Unhealthy");
}

#[tokio::test]
async fn missing_input_is_reported_not_fatal() {
    // ---
    let dir = tempfile::tempdir().unwrap();
    let app = app_with(&dir);

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "LOAD_ERROR");

    let (status, _) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/legend").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 6);
}

/// Reading source that takes a while to answer, like a large file on slow disk.
struct SlowSource {
    delay: Duration,
}

impl ReadingSource for SlowSource {
    fn load_readings(&self) -> PipelineResult<Vec<RawReading>> {
        // ---
        std::thread::sleep(self.delay);
        Ok(vec![RawReading {
            sensor_id: "A1".to_string(),
            timestamp_raw: "2024-01-01 09:00:00".to_string(),
            pollutant_raw: "12".to_string(),
            geo_raw: String::new(),
        }])
    }
}

struct NoSites;

impl SiteSource for NoSites {
    fn load_sites(&self) -> PipelineResult<Vec<SiteInfo>> {
        Ok(Vec::new())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn refresh_during_load_keeps_runtime_responsive() {
    // ---
    let cache = Arc::new(SnapshotCache::new(
        SlowSource {
            delay: Duration::from_millis(600),
        },
        NoSites,
    ));
    let app = routes::router(cache, Config::new("unused.csv", "unused.csv"));

    // First request starts the slow load and holds the cache lock
    let loading = tokio::spawn({
        let app = app.clone();
        async move { get(&app, "/status").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Refresh arrives while the load is still running
    let refreshing = tokio::spawn({
        let app = app.clone();
        async move { send(&app, "POST", "/refresh").await }
    });

    // A short timer on the same single runtime thread must still fire on time
    let started = Instant::now();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let tick = started.elapsed();
    assert!(
        tick < Duration::from_millis(200),
        "runtime thread was blocked for {:?}",
        tick
    );

    let (status, _) = loading.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    let (status, body) = refreshing.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["readings"], 1);
}
