//! Power unit detection.
//!
//! Sources report either kilowatts or watts without saying which. The
//! `Auto` strategy guesses from the solar column alone: a maximum above the
//! threshold means the whole table is in watts. A site that genuinely
//! produces more than the threshold in kW will be mis-scaled in `Auto` mode;
//! declare `Kilowatts` for those.

use serde::Deserialize;
use std::str::FromStr;

pub const DEFAULT_WATTS_THRESHOLD: f64 = 100.0;
const WATTS_PER_KILOWATT: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum UnitStrategy {
    /// Treat the table as watts when max solar exceeds `threshold`.
    Auto { threshold: f64 },
    Kilowatts,
    Watts,
}

impl Default for UnitStrategy {
    fn default() -> Self {
        UnitStrategy::Auto {
            threshold: DEFAULT_WATTS_THRESHOLD,
        }
    }
}

impl UnitStrategy {
    /// Divisor to apply to every power column, decided once for the table.
    ///
    /// `solar` holds the raw, pre-normalization solar values.
    pub fn divisor(&self, solar: &[f64]) -> f64 {
        match self {
            UnitStrategy::Kilowatts => 1.0,
            UnitStrategy::Watts => WATTS_PER_KILOWATT,
            UnitStrategy::Auto { threshold } => {
                let max = solar.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if max > *threshold {
                    WATTS_PER_KILOWATT
                } else {
                    1.0
                }
            }
        }
    }

    /// Same strategy with a different auto threshold; declared units are kept.
    pub fn with_threshold(self, threshold: f64) -> Self {
        match self {
            UnitStrategy::Auto { .. } => UnitStrategy::Auto { threshold },
            declared => declared,
        }
    }
}

impl FromStr for UnitStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(UnitStrategy::default()),
            "kw" | "kilowatts" => Ok(UnitStrategy::Kilowatts),
            "w" | "watts" => Ok(UnitStrategy::Watts),
            other => Err(format!("unknown unit mode '{other}' (expected auto, kw or w)")),
        }
    }
}
