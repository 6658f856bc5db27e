//! PM2.5 health categories, their colors, and advisory text.
//!
//! Every lookup is an exhaustive `match` over [`Category`], so adding a
//! variant without a color or advisory is a compile error rather than a
//! silent default at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

// ---

/// Health category derived from a PM2.5 concentration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    NoData,
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
}

/// RGBA color quadruple as consumed by map layers.
pub type Rgba = [u8; 4];

impl Category {
    // ---
    /// All categories in ascending severity, `NoData` first.
    pub const ALL: [Category; 6] = [
        Category::NoData,
        Category::Good,
        Category::Moderate,
        Category::UnhealthySensitive,
        Category::Unhealthy,
        Category::VeryUnhealthy,
    ];

    /// Display name shown in banners and tables.
    pub fn label(&self) -> &'static str {
        match self {
            Category::NoData => "No data",
            Category::Good => "Good",
            Category::Moderate => "Moderate",
            Category::UnhealthySensitive => "Unhealthy (Sensitive Groups)",
            Category::Unhealthy => "Unhealthy",
            Category::VeryUnhealthy => "Very Unhealthy",
        }
    }

    pub fn color(&self) -> Rgba {
        match self {
            Category::Good => [0, 200, 0, 200],
            Category::Moderate => [255, 215, 0, 200],
            Category::UnhealthySensitive => [255, 140, 0, 200],
            Category::Unhealthy => [255, 0, 0, 200],
            Category::VeryUnhealthy => [128, 0, 128, 200],
            Category::NoData => [120, 120, 120, 120],
        }
    }

    /// What a resident should do at this level.
    pub fn advice(&self) -> &'static str {
        match self {
            Category::Good => "Great time to be outside.",
            Category::Moderate => "Most people are fine. If you have asthma, take breaks.",
            Category::UnhealthySensitive => {
                "If you have asthma or heart conditions, limit outdoor activity."
            }
            Category::Unhealthy => "Limit outdoor time. Consider staying indoors.",
            Category::VeryUnhealthy => "Avoid outdoor activity. Stay indoors if possible.",
            Category::NoData => "No recent reading available.",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = PipelineError;

    /// Parse a display name (see [`Category::label`]) back into a category.
    fn from_str(s: &str) -> PipelineResult<Self> {
        // ---
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PipelineError::configuration(format!("unknown category '{}'", s)))
    }
}

// ---

/// Inclusive upper bounds (μg/m³) of the first four non-empty categories.
///
/// Anything above `unhealthy_max` is `VeryUnhealthy`. The fields are private
/// so a `Breakpoints` value is always strictly ascending once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakpoints {
    good_max: f64,
    moderate_max: f64,
    sensitive_max: f64,
    unhealthy_max: f64,
}

impl Default for Breakpoints {
    /// Standard AQI PM2.5 breakpoints.
    fn default() -> Self {
        Self {
            good_max: 12.0,
            moderate_max: 35.4,
            sensitive_max: 55.4,
            unhealthy_max: 150.4,
        }
    }
}

impl Breakpoints {
    // ---
    /// Build a validated table. Bounds must be finite, non-negative and
    /// strictly ascending.
    pub fn new(
        good_max: f64,
        moderate_max: f64,
        sensitive_max: f64,
        unhealthy_max: f64,
    ) -> PipelineResult<Self> {
        // ---
        let bounds = [good_max, moderate_max, sensitive_max, unhealthy_max];

        if let Some(bad) = bounds.iter().find(|b| !b.is_finite() || **b < 0.0) {
            return Err(PipelineError::configuration(format!(
                "breakpoint {} must be a finite, non-negative number",
                bad
            )));
        }
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::configuration(format!(
                "breakpoints must be strictly ascending, got {:?}",
                bounds
            )));
        }

        Ok(Self {
            good_max,
            moderate_max,
            sensitive_max,
            unhealthy_max,
        })
    }

    /// Parse a comma-separated list of exactly four bounds, e.g.
    /// `"12,35.4,55.4,150.4"`.
    pub fn parse(list: &str) -> PipelineResult<Self> {
        // ---
        let values = list
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|e| {
                    PipelineError::configuration(format!("invalid breakpoint '{}': {}", part, e))
                })
            })
            .collect::<PipelineResult<Vec<f64>>>()?;

        match values.as_slice() {
            [a, b, c, d] => Self::new(*a, *b, *c, *d),
            _ => Err(PipelineError::configuration(format!(
                "expected 4 breakpoints, got {}",
                values.len()
            ))),
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [
            self.good_max,
            self.moderate_max,
            self.sensitive_max,
            self.unhealthy_max,
        ]
    }

    /// Map a concentration to its category. `None` is `NoData`.
    pub fn categorize(&self, pm25: Option<f64>) -> Category {
        // ---
        let Some(v) = pm25 else {
            return Category::NoData;
        };

        if v <= self.good_max {
            Category::Good
        } else if v <= self.moderate_max {
            Category::Moderate
        } else if v <= self.sensitive_max {
            Category::UnhealthySensitive
        } else if v <= self.unhealthy_max {
            Category::Unhealthy
        } else {
            Category::VeryUnhealthy
        }
    }

    /// Concentration range `(lower_exclusive, upper_inclusive)` covered by a
    /// category. `NoData` has no range; `VeryUnhealthy` has no upper bound.
    pub fn range_of(&self, category: Category) -> Option<(Option<f64>, Option<f64>)> {
        match category {
            Category::NoData => None,
            Category::Good => Some((None, Some(self.good_max))),
            Category::Moderate => Some((Some(self.good_max), Some(self.moderate_max))),
            Category::UnhealthySensitive => {
                Some((Some(self.moderate_max), Some(self.sensitive_max)))
            }
            Category::Unhealthy => Some((Some(self.sensitive_max), Some(self.unhealthy_max))),
            Category::VeryUnhealthy => Some((Some(self.unhealthy_max), None)),
        }
    }
}

/// Categorize with the standard AQI table.
pub fn categorize(pm25: Option<f64>) -> Category {
    Breakpoints::default().categorize(pm25)
}
