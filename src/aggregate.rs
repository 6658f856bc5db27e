//! Per-sensor latest status, short-horizon change, and area-wide status.
//!
//! Everything here is a pure function of the readings and site rows it is
//! given. Nothing is cached between calls, so running twice over the same
//! input yields the same output.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::category::{Breakpoints, Category, Rgba};
use crate::models::{Reading, SiteInfo};

// ---

/// Most recent reading for one sensor, enriched for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestStatus {
    // ---
    pub sensor_id: String,
    pub label: String,
    pub timestamp: Option<NaiveDateTime>,
    pub pm25: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub category: Category,
    pub color: Rgba,
    pub change_since_last: f64,
}

/// Mean-based status across all sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaStatus {
    pub average_pm25: Option<f64>,
    pub category: Category,
}

/// Group readings by sensor id, keeping groups in order of first appearance
/// and readings in input order.
pub fn group_by_sensor(readings: &[Reading]) -> Vec<(&str, Vec<&Reading>)> {
    // ---
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Reading>)> = Vec::new();

    for r in readings {
        let id = r.sensor_id.as_str();
        match index.get(id) {
            Some(&i) => groups[i].1.push(r),
            None => {
                index.insert(id, groups.len());
                groups.push((id, vec![r]));
            }
        }
    }

    groups
}

/// Pick the latest reading of a group: greatest timestamp, last-seen wins on
/// ties. A group whose timestamps are all missing yields its last reading in
/// input order.
pub fn select_latest<'a>(group: &[&'a Reading]) -> Option<&'a Reading> {
    // ---
    let mut latest: Option<&'a Reading> = None;

    for r in group.iter().copied() {
        let Some(ts) = r.timestamp else { continue };
        match latest.and_then(|l| l.timestamp) {
            Some(best) if ts < best => {}
            _ => latest = Some(r),
        }
    }

    latest.or_else(|| group.last().copied())
}

/// Difference between the two chronologically last valid pm25 values.
///
/// Only readings with a pm25 value count. When the sensor has any timestamped
/// readings, untimed ones are ignored and the rest are ordered by timestamp
/// (stable); otherwise input order is used. Fewer than two values gives 0.0.
pub fn change_since_last(group: &[&Reading]) -> f64 {
    // ---
    let has_timestamps = group.iter().any(|r| r.timestamp.is_some());

    let mut valid: Vec<&Reading> = group
        .iter()
        .copied()
        .filter(|r| r.pm25.is_some())
        .filter(|r| !has_timestamps || r.timestamp.is_some())
        .collect();
    valid.sort_by_key(|r| r.timestamp);

    match valid.as_slice() {
        [.., prev, last] => match (last.pm25, prev.pm25) {
            (Some(a), Some(b)) => a - b,
            _ => 0.0,
        },
        _ => 0.0,
    }
}

/// Build one [`LatestStatus`] per sensor.
///
/// Site labels are joined on the trimmed sensor id; the first directory row
/// for an id wins, and unmatched sensors use their id as label.
pub fn latest_per_sensor(
    readings: &[Reading],
    sites: &[SiteInfo],
    breakpoints: &Breakpoints,
) -> Vec<LatestStatus> {
    // ---
    let mut labels: HashMap<&str, &str> = HashMap::new();
    for site in sites {
        labels
            .entry(site.sensor_id.trim())
            .or_insert(site.label.as_str());
    }

    let statuses: Vec<LatestStatus> = group_by_sensor(readings)
        .into_iter()
        .filter_map(|(sensor_id, group)| {
            let latest = select_latest(&group)?;
            let category = breakpoints.categorize(latest.pm25);
            let label = labels
                .get(sensor_id.trim())
                .copied()
                .unwrap_or(sensor_id)
                .to_string();

            Some(LatestStatus {
                sensor_id: sensor_id.to_string(),
                label,
                timestamp: latest.timestamp,
                pm25: latest.pm25,
                lat: latest.lat,
                lon: latest.lon,
                category,
                color: category.color(),
                change_since_last: change_since_last(&group),
            })
        })
        .collect();

    let unlabeled = statuses
        .iter()
        .filter(|s| s.label == s.sensor_id)
        .count();
    tracing::debug!(
        "Built {} latest statuses from {} readings ({} without site label)",
        statuses.len(),
        readings.len(),
        unlabeled
    );

    statuses
}

/// Average the latest pm25 values, ignoring missing ones.
pub fn area_status(statuses: &[LatestStatus], breakpoints: &Breakpoints) -> AreaStatus {
    // ---
    let values: Vec<f64> = statuses.iter().filter_map(|s| s.pm25).collect();

    let average_pm25 = if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    };

    AreaStatus {
        average_pm25,
        category: breakpoints.categorize(average_pm25),
    }
}
