//! Combined date + time parsing.
//!
//! The format is inferred once from the first row and then applied strictly
//! to every row, so a table never mixes month-first and day-first dates.

use chrono::NaiveDateTime;
use tracing::debug;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Joins a date and a time the way the source columns are concatenated.
pub fn combine(date: &str, time: &str) -> String {
    format!("{} {}", date.trim(), time.trim())
}

/// Every candidate format, in the order inference tries them.
fn candidates() -> impl Iterator<Item = String> {
    DATE_FORMATS
        .iter()
        .flat_map(|d| TIME_FORMATS.iter().map(move |t| format!("{d} {t}")))
        .chain(std::iter::once(ISO_FORMAT.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParser {
    format: String,
}

impl TimestampParser {
    /// Uses `format` verbatim (chrono `strftime` syntax).
    pub fn with_format(format: impl Into<String>) -> Self {
        TimestampParser {
            format: format.into(),
        }
    }

    /// Picks the first candidate format that parses `sample`.
    pub fn infer(sample: &str) -> Option<Self> {
        let sample = sample.trim();
        let format = candidates().find(|f| NaiveDateTime::parse_from_str(sample, f).is_ok())?;
        debug!(sample, format = %format, "Inferred timestamp format");
        Some(TimestampParser { format })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn parse(&self, value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value.trim(), &self.format).ok()
    }
}
