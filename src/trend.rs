//! Trailing-window trend extraction for a single sensor.

use chrono::{Duration, NaiveDateTime};

use crate::models::Reading;

// ---

/// Default trailing window.
pub const DEFAULT_WINDOW_HOURS: u32 = 24;

pub fn window_hours(hours: u32) -> Duration {
    Duration::hours(i64::from(hours))
}

/// Readings of `sensor_id` whose timestamp lies within `window` of that
/// sensor's own latest timestamp (both ends inclusive), oldest first.
///
/// A sensor with no valid timestamp at all returns every one of its readings
/// in input order. An unknown sensor returns an empty vector.
pub fn trend_window(readings: &[Reading], sensor_id: &str, window: Duration) -> Vec<Reading> {
    // ---
    let sensor_id = sensor_id.trim();
    let history: Vec<&Reading> = readings
        .iter()
        .filter(|r| r.sensor_id == sensor_id)
        .collect();

    let Some(last_time) = history.iter().filter_map(|r| r.timestamp).max() else {
        return history.into_iter().cloned().collect();
    };
    let since = last_time
        .checked_sub_signed(window)
        .unwrap_or(NaiveDateTime::MIN);

    let mut series: Vec<Reading> = history
        .into_iter()
        .filter(|r| r.timestamp.is_some_and(|ts| ts >= since && ts <= last_time))
        .cloned()
        .collect();
    series.sort_by_key(|r| r.timestamp);

    tracing::debug!(
        "Trend for {}: {} readings since {}",
        sensor_id,
        series.len(),
        since
    );

    series
}
