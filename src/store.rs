//! Reading Store and Site Directory adapters, plus the snapshot cache that
//! holds the last load until an explicit refresh.
//!
//! The adapters are deliberately thin: they read CSV rows into the raw models
//! and leave all interpretation to the normalizer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{normalize, RawReading, RawSite, Reading, SiteInfo};

// ---

/// Source of raw sensor rows.
pub trait ReadingSource: Send + Sync {
    fn load_readings(&self) -> PipelineResult<Vec<RawReading>>;
}

/// Source of sensor location labels.
pub trait SiteSource: Send + Sync {
    fn load_sites(&self) -> PipelineResult<Vec<SiteInfo>>;
}

/// Reading Store backed by a CSV file with `sn,timestamp_local,pm25,geo`
/// columns.
#[derive(Debug, Clone)]
pub struct CsvReadingStore {
    path: PathBuf,
}

impl CsvReadingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReadingSource for CsvReadingStore {
    fn load_readings(&self) -> PipelineResult<Vec<RawReading>> {
        read_csv_rows(&self.path, "reading store")
    }
}

/// Site Directory backed by a CSV file with `ID,Location Description`
/// columns.
#[derive(Debug, Clone)]
pub struct CsvSiteDirectory {
    path: PathBuf,
}

impl CsvSiteDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SiteSource for CsvSiteDirectory {
    fn load_sites(&self) -> PipelineResult<Vec<SiteInfo>> {
        // ---
        let rows: Vec<RawSite> = read_csv_rows(&self.path, "site directory")?;
        let total = rows.len();
        let sites: Vec<SiteInfo> = rows.iter().filter_map(RawSite::to_site_info).collect();

        if sites.len() < total {
            tracing::debug!(
                "Site directory: {} of {} rows had a blank id or description",
                total - sites.len(),
                total
            );
        }
        Ok(sites)
    }
}

/// Read every decodable row of a CSV file. Rows the CSV layer cannot decode
/// at all are logged and skipped; a missing or unreadable file is an error.
fn read_csv_rows<T: DeserializeOwned>(
    path: &Path,
    source_name: &'static str,
) -> PipelineResult<Vec<T>> {
    // ---
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::load(source_name, format!("{}: {}", path.display(), e)))?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                skipped += 1;
                tracing::warn!("Skipping {} row {}: {}", source_name, i + 1, e);
            }
        }
    }

    tracing::info!(
        "Loaded {} rows from {} ({}), skipped {}",
        rows.len(),
        source_name,
        path.display(),
        skipped
    );
    Ok(rows)
}

// ---

/// One immutable load of readings and sites. Every pipeline run works on
/// exactly one snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub readings: Vec<Reading>,
    pub sites: Vec<SiteInfo>,
    pub loaded_at: DateTime<Utc>,
}

impl Snapshot {
    // ---
    pub fn new(readings: Vec<Reading>, sites: Vec<SiteInfo>) -> Self {
        Self {
            readings,
            sites,
            loaded_at: Utc::now(),
        }
    }

    /// Fetch from both collaborators and normalize the readings.
    pub fn load(readings: &dyn ReadingSource, sites: &dyn SiteSource) -> PipelineResult<Self> {
        // ---
        let raw = readings.load_readings()?;
        let sites = sites.load_sites()?;
        Ok(Self::new(normalize(&raw), sites))
    }
}

/// Holds the last loaded [`Snapshot`] until [`SnapshotCache::invalidate`] is
/// called. Readers share the snapshot through an `Arc` and never see a
/// partially replaced one.
pub struct SnapshotCache {
    readings: Box<dyn ReadingSource>,
    sites: Box<dyn SiteSource>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    // ---
    pub fn new(readings: impl ReadingSource + 'static, sites: impl SiteSource + 'static) -> Self {
        Self {
            readings: Box::new(readings),
            sites: Box::new(sites),
            current: RwLock::new(None),
        }
    }

    /// Return the cached snapshot, loading it on first use.
    pub fn get(&self) -> PipelineResult<Arc<Snapshot>> {
        // ---
        if let Some(snapshot) = self.current.read().as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.current.write();
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        tracing::info!("Snapshot cache empty, loading from collaborators");
        let snapshot = Arc::new(Snapshot::load(self.readings.as_ref(), self.sites.as_ref())?);
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the cached snapshot; the next [`get`](Self::get) re-fetches.
    pub fn invalidate(&self) {
        // ---
        tracing::info!("Snapshot cache invalidated");
        *self.current.write() = None;
    }

    /// Invalidate and reload immediately.
    pub fn refresh(&self) -> PipelineResult<Arc<Snapshot>> {
        self.invalidate();
        self.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        // ---
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_reading_store_reads_raw_rows() {
        // ---
        let file = csv_file(
            "sn,timestamp_local,pm25,geo,extra\n\
             A1,2024-01-02 10:00:00,8.5,\"{'lat': 42.39, 'lon': -71.03}\",x\n\
             A2,garbage,n/a,\"{bad\",y\n\
             A3,2024-01-02 11:00:00,,,z\n",
        );
        let rows = CsvReadingStore::new(file.path()).load_readings().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].sensor_id, "A1");
        assert_eq!(rows[0].geo_raw, "{'lat': 42.39, 'lon': -71.03}");
        assert_eq!(rows[1].pollutant_raw, "n/a");
        assert_eq!(rows[2].pollutant_raw, "");
        assert_eq!(rows[2].geo_raw, "");
    }

    #[test]
    fn test_site_directory_trims_and_skips_blank() {
        // ---
        let file = csv_file(
            "ID,Location Description\n\
             \" A1 \",Library\n\
             A2,\n",
        );
        let sites = CsvSiteDirectory::new(file.path()).load_sites().unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].sensor_id, "A1");
        assert_eq!(sites[0].label, "Library");
    }

    #[test]
    fn test_missing_file_is_load_error() {
        // ---
        let err = CsvReadingStore::new("/definitely/not/here.csv")
            .load_readings()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Load { .. }));
    }

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    impl ReadingSource for CountingSource {
        fn load_readings(&self) -> PipelineResult<Vec<RawReading>> {
            // ---
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![RawReading {
                sensor_id: "A1".to_string(),
                timestamp_raw: "2024-01-02 10:00:00".to_string(),
                pollutant_raw: "5".to_string(),
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

    #[test]
    fn test_cache_loads_once_until_invalidated() {
        // ---
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SnapshotCache::new(
            CountingSource {
                calls: Arc::clone(&calls),
            },
            NoSites,
        );

        assert!(!cache.is_loaded());
        let first = cache.get().unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.readings[0].pm25, Some(5.0));

        cache.invalidate();
        assert!(!cache.is_loaded());
        let third = cache.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.refresh().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
