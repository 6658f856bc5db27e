//! Shapes consumed by map, table, chart and banner renderers.
//!
//! Each builder is a pure function over pipeline output; the HTTP layer only
//! serializes what these return.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::Serialize;

use crate::aggregate::{AreaStatus, LatestStatus};
use crate::category::{Breakpoints, Category, Rgba};
use crate::models::Reading;
use crate::pipeline::Dashboard;
use crate::rank::{biggest_improvement, highest_reading, rank, RankOrder};
use crate::trend::trend_window;

// ---

/// Initial zoom level for the map view.
pub const MAP_ZOOM: u8 = 13;

/// Marker radius: pm25 (1 when missing) clamped to 1..=80, times 10.
pub fn marker_radius(pm25: Option<f64>) -> f64 {
    pm25.unwrap_or(1.0).clamp(1.0, 80.0) * 10.0
}

fn format_pm25(pm25: Option<f64>) -> String {
    match pm25 {
        Some(v) => format!("{:.1} µg/m³", v),
        None => "No data".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    // ---
    pub sensor_id: String,
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub color: Rgba,
    pub radius: f64,
    pub pm25: Option<f64>,
    pub category: Category,
    pub category_label: &'static str,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    /// `[lat, lon]` mean of all points, absent when there are none.
    pub center: Option<[f64; 2]>,
    pub zoom: u8,
    pub points: Vec<MapPoint>,
}

/// Map markers for every status with both coordinates.
pub fn map_points(statuses: &[LatestStatus]) -> Vec<MapPoint> {
    // ---
    statuses
        .iter()
        .filter_map(|s| {
            let (lat, lon) = (s.lat?, s.lon?);
            Some(MapPoint {
                sensor_id: s.sensor_id.clone(),
                label: s.label.clone(),
                lat,
                lon,
                color: s.color,
                radius: marker_radius(s.pm25),
                pm25: s.pm25,
                category: s.category,
                category_label: s.category.label(),
                timestamp: s.timestamp,
            })
        })
        .collect()
}

pub fn map_view(statuses: &[LatestStatus]) -> MapView {
    // ---
    let points = map_points(statuses);
    let center = if points.is_empty() {
        None
    } else {
        let n = points.len() as f64;
        let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
        let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
        Some([lat, lon])
    };

    MapView {
        center,
        zoom: MAP_ZOOM,
        points,
    }
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotspotRow {
    // ---
    pub sensor_id: String,
    pub label: String,
    pub pm25: Option<f64>,
    pub category: Category,
    pub category_label: &'static str,
    pub timestamp: Option<NaiveDateTime>,
    pub change_since_last: f64,
}

impl From<&LatestStatus> for HotspotRow {
    fn from(s: &LatestStatus) -> Self {
        Self {
            sensor_id: s.sensor_id.clone(),
            label: s.label.clone(),
            pm25: s.pm25,
            category: s.category,
            category_label: s.category.label(),
            timestamp: s.timestamp,
            change_since_last: s.change_since_last,
        }
    }
}

/// Ranked table rows for the hotspot view.
pub fn hotspot_table(statuses: &[LatestStatus], order: RankOrder, limit: usize) -> Vec<HotspotRow> {
    rank(statuses, order, limit)
        .iter()
        .map(HotspotRow::from)
        .collect()
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: Option<NaiveDateTime>,
    pub pm25: Option<f64>,
}

/// Chart series for one sensor.
pub fn trend_series(readings: &[Reading], sensor_id: &str, window: Duration) -> Vec<TrendPoint> {
    trend_window(readings, sensor_id, window)
        .into_iter()
        .map(|r| TrendPoint {
            timestamp: r.timestamp,
            pm25: r.pm25,
        })
        .collect()
}

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaBanner {
    // ---
    pub category: Category,
    pub category_label: &'static str,
    pub average_pm25: Option<f64>,
    pub color: Rgba,
    pub advice: &'static str,
    pub message: String,
}

impl From<&AreaStatus> for AreaBanner {
    fn from(area: &AreaStatus) -> Self {
        // ---
        let average = match area.average_pm25 {
            Some(v) => format!("{:.1} µg/m³", v),
            None => "no data".to_string(),
        };

        Self {
            category: area.category,
            category_label: area.category.label(),
            average_pm25: area.average_pm25,
            color: area.category.color(),
            advice: area.category.advice(),
            message: format!(
                "Overall right now: {} (Avg PM2.5: {})",
                area.category, average
            ),
        }
    }
}

/// A single sensor singled out by a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub sensor_id: String,
    pub label: String,
    pub pm25: Option<f64>,
    pub change_since_last: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusBanners {
    // ---
    pub area: AreaBanner,
    pub highest: Option<Highlight>,
    pub improvement: Option<Highlight>,
    pub sensor_count: usize,
    pub loaded_at: DateTime<Utc>,
}

pub fn status_banners(dashboard: &Dashboard, loaded_at: DateTime<Utc>) -> StatusBanners {
    // ---
    let highest = highest_reading(&dashboard.statuses).map(|s| Highlight {
        message: format!(
            "Highest PM2.5 right now: {} ({})",
            s.label,
            format_pm25(s.pm25)
        ),
        sensor_id: s.sensor_id,
        label: s.label,
        pm25: s.pm25,
        change_since_last: s.change_since_last,
    });

    let improvement = biggest_improvement(&dashboard.statuses).map(|s| Highlight {
        message: format!(
            "Biggest improvement (last two readings): {} ({:.1} µg/m³)",
            s.label, s.change_since_last
        ),
        sensor_id: s.sensor_id,
        label: s.label,
        pm25: s.pm25,
        change_since_last: s.change_since_last,
    });

    StatusBanners {
        area: AreaBanner::from(&dashboard.area),
        highest,
        improvement,
        sensor_count: dashboard.statuses.len(),
        loaded_at,
    }
}

// ---

/// Entry in the location selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorOption {
    pub label: String,
    pub sensor_id: String,
}

/// Unique labels sorted alphabetically. When several sensors share a label
/// the first one in status order is offered.
pub fn sensor_options(statuses: &[LatestStatus]) -> Vec<SensorOption> {
    // ---
    let mut options: Vec<SensorOption> = Vec::with_capacity(statuses.len());
    for s in statuses {
        if options.iter().any(|o| o.label == s.label) {
            continue;
        }
        options.push(SensorOption {
            label: s.label.clone(),
            sensor_id: s.sensor_id.clone(),
        });
    }
    options.sort_by(|a, b| a.label.cmp(&b.label));
    options
}

/// The "right now" panel for one selected sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDetail {
    // ---
    pub sensor_id: String,
    pub label: String,
    pub category: Category,
    pub category_label: &'static str,
    pub pm25: Option<f64>,
    pub pm25_display: String,
    pub updated: Option<NaiveDateTime>,
    pub updated_display: String,
    pub advice: &'static str,
    pub color: Rgba,
    pub change_since_last: f64,
}

impl From<&LatestStatus> for SensorDetail {
    fn from(s: &LatestStatus) -> Self {
        // ---
        let updated_display = match s.timestamp {
            Some(ts) => ts.format("%I:%M %p").to_string(),
            None => "Unknown".to_string(),
        };

        Self {
            sensor_id: s.sensor_id.clone(),
            label: s.label.clone(),
            category: s.category,
            category_label: s.category.label(),
            pm25: s.pm25,
            pm25_display: format_pm25(s.pm25),
            updated: s.timestamp,
            updated_display,
            advice: s.category.advice(),
            color: s.color,
            change_since_last: s.change_since_last,
        }
    }
}

// ---

/// One row of the color guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub category: Category,
    pub label: &'static str,
    pub color: Rgba,
    pub advice: &'static str,
    pub above: Option<f64>,
    pub up_to: Option<f64>,
}

pub fn legend(breakpoints: &Breakpoints) -> Vec<LegendEntry> {
    // ---
    Category::ALL
        .into_iter()
        .map(|category| {
            let (above, up_to) = breakpoints.range_of(category).unwrap_or((None, None));
            LegendEntry {
                category,
                label: category.label(),
                color: category.color(),
                advice: category.advice(),
                above,
                up_to,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::aggregate::latest_per_sensor;
    use crate::aggregate::tests::{at, reading};
    use crate::models::SiteInfo;
    use crate::store::Snapshot;
    use crate::trend::window_hours;

    fn snapshot() -> Snapshot {
        // ---
        let mut no_geo = reading("C3", Some(at(1, 9)), Some(200.0));
        no_geo.lat = None;
        no_geo.lon = None;

        Snapshot::new(
            vec![
                reading("A1", Some(at(1, 8)), Some(10.0)),
                reading("A1", Some(at(1, 9)), Some(40.0)),
                reading("B2", Some(at(1, 14)), None),
                no_geo,
            ],
            vec![SiteInfo {
                sensor_id: "A1".to_string(),
                label: "Library".to_string(),
            }],
        )
    }

    #[test]
    fn test_marker_radius() {
        // ---
        assert_eq!(marker_radius(None), 10.0);
        assert_eq!(marker_radius(Some(0.2)), 10.0);
        assert_eq!(marker_radius(Some(12.5)), 125.0);
        assert_eq!(marker_radius(Some(500.0)), 800.0);
    }

    #[test]
    fn test_map_excludes_readings_without_coordinates() {
        // ---
        let snap = snapshot();
        let statuses = latest_per_sensor(&snap.readings, &snap.sites, &Breakpoints::default());
        let view = map_view(&statuses);

        let ids: Vec<&str> = view.points.iter().map(|p| p.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "B2"]);
        assert_eq!(view.center, Some([42.39, -71.03]));
        assert_eq!(view.zoom, MAP_ZOOM);
        assert_eq!(view.points[1].color, Category::NoData.color());

        // Still counted in the aggregate
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[2].category, Category::VeryUnhealthy);
    }

    #[test]
    fn test_empty_map_has_no_center() {
        // ---
        let view = map_view(&[]);
        assert!(view.points.is_empty());
        assert_eq!(view.center, None);
    }

    #[test]
    fn test_banners() {
        // ---
        let snap = snapshot();
        let dashboard = Dashboard::build(&snap, &Breakpoints::default());
        let banners = status_banners(&dashboard, snap.loaded_at);

        assert_eq!(banners.area.average_pm25, Some(120.0));
        assert_eq!(banners.area.category, Category::Unhealthy);
        assert_eq!(
            banners.area.message,
            "Overall right now: Unhealthy (Avg PM2.5: 120.0 µg/m³)"
        );
        assert_eq!(banners.highest.as_ref().unwrap().sensor_id, "C3");
        // B2 and C3 have no change; A1 rose, so the first zero-change sensor wins
        assert_eq!(banners.improvement.as_ref().unwrap().sensor_id, "B2");
        assert_eq!(banners.sensor_count, 3);
    }

    #[test]
    fn test_no_data_banner() {
        // ---
        let banner = AreaBanner::from(&AreaStatus {
            average_pm25: None,
            category: Category::NoData,
        });
        assert_eq!(banner.message, "Overall right now: No data (Avg PM2.5: no data)");
        assert_eq!(banner.advice, "No recent reading available.");
    }

    #[test]
    fn test_hotspot_table_and_detail() {
        // ---
        let snap = snapshot();
        let statuses = latest_per_sensor(&snap.readings, &snap.sites, &Breakpoints::default());

        let rows = hotspot_table(&statuses, RankOrder::Highest, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sensor_id, "C3");
        assert_eq!(rows[1].label, "Library");

        let detail = SensorDetail::from(&statuses[0]);
        assert_eq!(detail.pm25_display, "40.0 µg/m³");
        assert_eq!(detail.updated_display, "09:00 AM");
        assert_eq!(detail.advice, Category::Moderate.advice());
        assert_eq!(detail.change_since_last, 30.0);

        let detail = SensorDetail::from(&statuses[1]);
        assert_eq!(detail.pm25_display, "No data");
        assert_eq!(detail.updated_display, "02:00 PM");
    }

    #[test]
    fn test_sensor_options_sorted_unique() {
        // ---
        let readings = vec![
            reading("Z", Some(at(1, 8)), Some(1.0)),
            reading("A", Some(at(1, 8)), Some(1.0)),
            reading("M", Some(at(1, 8)), Some(1.0)),
        ];
        let sites = vec![
            SiteInfo {
                sensor_id: "A".to_string(),
                label: "Park".to_string(),
            },
            SiteInfo {
                sensor_id: "M".to_string(),
                label: "Park".to_string(),
            },
        ];
        let statuses = latest_per_sensor(&readings, &sites, &Breakpoints::default());
        let options = sensor_options(&statuses);

        let labels: Vec<(&str, &str)> = options
            .iter()
            .map(|o| (o.label.as_str(), o.sensor_id.as_str()))
            .collect();
        assert_eq!(labels, vec![("Park", "A"), ("Z", "Z")]);
    }

    #[test]
    fn test_trend_series_points() {
        // ---
        let snap = snapshot();
        let series = trend_series(&snap.readings, "A1", window_hours(24));
        assert_eq!(
            series,
            vec![
                TrendPoint {
                    timestamp: Some(at(1, 8)),
                    pm25: Some(10.0)
                },
                TrendPoint {
                    timestamp: Some(at(1, 9)),
                    pm25: Some(40.0)
                },
            ]
        );
    }

    #[test]
    fn test_legend_covers_all_categories() {
        // ---
        let entries = legend(&Breakpoints::default());
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[1].up_to, Some(12.0));
        assert_eq!(entries[2].above, Some(12.0));
        assert_eq!(entries[5].up_to, None);
    }
}
