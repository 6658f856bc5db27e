//! One pipeline run over an immutable snapshot.

use serde::Serialize;

use crate::aggregate::{area_status, latest_per_sensor, AreaStatus, LatestStatus};
use crate::category::Breakpoints;
use crate::store::Snapshot;

// ---

/// Everything derived from a snapshot in a single run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub statuses: Vec<LatestStatus>,
    pub area: AreaStatus,
}

impl Dashboard {
    // ---
    /// Recompute all derived records from scratch.
    pub fn build(snapshot: &Snapshot, breakpoints: &Breakpoints) -> Self {
        // ---
        let statuses = latest_per_sensor(&snapshot.readings, &snapshot.sites, breakpoints);
        let area = area_status(&statuses, breakpoints);

        tracing::debug!(
            "Dashboard built: {} sensors, area {} ({:?})",
            statuses.len(),
            area.category,
            area.average_pm25
        );

        Self { statuses, area }
    }

    /// Look up a sensor's status by id (trimmed).
    pub fn status(&self, sensor_id: &str) -> Option<&LatestStatus> {
        let sensor_id = sensor_id.trim();
        self.statuses.iter().find(|s| s.sensor_id == sensor_id)
    }
}
