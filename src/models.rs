//! Data models for the air-quality pipeline and the normalizer that turns raw
//! store rows into canonical readings.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---

/// Raw sensor row from the Reading Store. Every field is kept as text so a
/// malformed cell never rejects the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(rename = "sn", default)]
    pub sensor_id: String,
    #[serde(rename = "timestamp_local", default)]
    pub timestamp_raw: String,
    #[serde(rename = "pm25", default)]
    pub pollutant_raw: String,
    #[serde(rename = "geo", default)]
    pub geo_raw: String,
}

/// Canonical reading. A field that failed to parse is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub sensor_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub pm25: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Reading {
    /// Both coordinates present; readings without them stay out of map output.
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}

/// Raw row from the Site Directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSite {
    // ---
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Location Description", default)]
    pub location_description: String,
}

/// Human-readable label for a sensor. `sensor_id` is the trimmed join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    pub sensor_id: String,
    pub label: String,
}

impl RawSite {
    // ---
    /// Rows with a blank id or blank description carry nothing to join and
    /// return `None`; such sensors fall back to their id as label.
    pub fn to_site_info(&self) -> Option<SiteInfo> {
        // ---
        let sensor_id = self.id.trim();
        let label = self.location_description.trim();

        if sensor_id.is_empty() || label.is_empty() {
            return None;
        }

        Some(SiteInfo {
            sensor_id: sensor_id.to_string(),
            label: label.to_string(),
        })
    }
}

/// Normalization helpers
impl RawReading {
    // ---
    pub fn to_reading(&self) -> Reading {
        // ---
        let (lat, lon) = parse_geo(&self.geo_raw);

        Reading {
            sensor_id: self.sensor_id.trim().to_string(),
            timestamp: parse_timestamp(&self.timestamp_raw),
            pm25: parse_pm25(&self.pollutant_raw),
            lat,
            lon,
        }
    }
}

/// Normalize a batch of raw rows. Output has the same length and order.
pub fn normalize(raw: &[RawReading]) -> Vec<Reading> {
    // ---
    let readings: Vec<Reading> = raw.iter().map(RawReading::to_reading).collect();

    tracing::debug!(
        "Normalized {} readings ({} without timestamp, {} without pm25, {} without coordinates)",
        readings.len(),
        readings.iter().filter(|r| r.timestamp.is_none()).count(),
        readings.iter().filter(|r| r.pm25.is_none()).count(),
        readings.iter().filter(|r| !r.has_coordinates()).count(),
    );

    readings
}

// ---

/// Wall-clock layouts accepted in addition to RFC 3339.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a local timestamp. Offsets, when present, are dropped and the
/// wall-clock part is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    // ---
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a PM2.5 concentration. Non-numeric, non-finite and negative values
/// are treated as no data rather than clamped.
pub fn parse_pm25(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Extract `lat`/`lon` from a string-encoded map. Each coordinate is
/// independent; a missing or non-numeric one is `None`.
pub fn parse_geo(raw: &str) -> (Option<f64>, Option<f64>) {
    // ---
    match parse_geo_map(raw) {
        Some(map) => (
            map.get("lat").and_then(Value::as_f64),
            map.get("lon").and_then(Value::as_f64),
        ),
        None => (None, None),
    }
}

/// Accepts JSON objects and Python-literal dicts (`{'lat': 1.0}`).
fn parse_geo_map(raw: &str) -> Option<Map<String, Value>> {
    // ---
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    serde_json::from_str::<Map<String, Value>>(s)
        .or_else(|_| serde_json::from_str(&python_literal_to_json(s)))
        .ok()
}

/// Rewrite single-quoted strings and `None`/`True`/`False` into JSON.
fn python_literal_to_json(s: &str) -> String {
    // ---
    fn flush(word: &mut String, out: &mut String) {
        match word.as_str() {
            "None" => out.push_str("null"),
            "True" => out.push_str("true"),
            "False" => out.push_str("false"),
            other => out.push_str(other),
        }
        word.clear();
    }

    let mut out = String::with_capacity(s.len());
    let mut word = String::new();
    let mut quote: Option<char> = None;

    for ch in s.chars() {
        match quote {
            Some(q) if ch == q => {
                out.push('"');
                quote = None;
            }
            Some(_) if ch == '"' => out.push_str("\\\""),
            Some(_) => out.push(ch),
            None if ch.is_ascii_alphabetic() => word.push(ch),
            None => {
                flush(&mut word, &mut out);
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                    out.push('"');
                } else {
                    out.push(ch);
                }
            }
        }
    }
    flush(&mut word, &mut out);

    out
}
