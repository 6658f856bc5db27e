//! Community air-quality status pipeline.
//!
//! Raw sensor rows flow through the normalizer (`models`), are reduced to one
//! status per sensor plus an area average (`aggregate`), categorized
//! (`category`), ranked (`rank`), sliced into trends (`trend`), and shaped for
//! rendering (`presentation`). `routes` exposes the result over HTTP.

pub mod aggregate;
pub mod category;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod presentation;
pub mod rank;
pub mod routes;
pub mod store;
pub mod trend;

pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use models::{RawReading, Reading, SiteInfo};
pub use pipeline::Dashboard;
pub use store::{CsvReadingStore, CsvSiteDirectory, Snapshot, SnapshotCache};
