//! Ordering of latest statuses for hotspot and improvement views.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::aggregate::LatestStatus;

// ---

/// Which view a ranking feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankOrder {
    /// Highest pm25 first, missing values last.
    #[default]
    Highest,
    /// Most negative `change_since_last` first.
    Improvement,
}

impl RankOrder {
    fn compare(&self, a: &LatestStatus, b: &LatestStatus) -> Ordering {
        // ---
        match self {
            RankOrder::Highest => match (a.pm25, b.pm25) {
                (Some(x), Some(y)) => y.total_cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            RankOrder::Improvement => a.change_since_last.total_cmp(&b.change_since_last),
        }
    }
}

/// Return a new, stably sorted vector of at most `limit` statuses. The input
/// slice is left untouched.
pub fn rank(statuses: &[LatestStatus], order: RankOrder, limit: usize) -> Vec<LatestStatus> {
    // ---
    let mut ranked: Vec<&LatestStatus> = statuses.iter().collect();
    ranked.sort_by(|a, b| order.compare(a, b));
    ranked.into_iter().take(limit).cloned().collect()
}

/// `descending` selects the hotspot view (pm25 high to low); otherwise the
/// improvement view (change low to high).
pub fn rank_by_concentration(
    statuses: &[LatestStatus],
    descending: bool,
    limit: usize,
) -> Vec<LatestStatus> {
    // ---
    let order = if descending {
        RankOrder::Highest
    } else {
        RankOrder::Improvement
    };
    rank(statuses, order, limit)
}

/// Sensor with the highest current reading, if any.
pub fn highest_reading(statuses: &[LatestStatus]) -> Option<LatestStatus> {
    rank(statuses, RankOrder::Highest, 1).into_iter().next()
}

/// Sensor whose last two readings dropped the most.
pub fn biggest_improvement(statuses: &[LatestStatus]) -> Option<LatestStatus> {
    rank(statuses, RankOrder::Improvement, 1).into_iter().next()
}
