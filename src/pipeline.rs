//! Ingestion and classification: raw CSV bytes in, normalized [`Table`] out.
//!
//! The steps run in a fixed order: parse, resolve headers, scale units,
//! build timestamps, sort, flag. A load either yields a complete table or
//! fails with a [`PipelineError`]; nothing is skipped.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::reading::{DEFAULT_ANOMALY_LOAD_THRESHOLD_KW, Reading, Table};
use crate::schema::{ColumnAliases, ColumnMap, TimeColumns, normalize_header, resolve_columns};
use crate::timestamp::{TimestampParser, combine};
use crate::units::UnitStrategy;

/// Knobs for [`load_table`]. The defaults reproduce the dashboard's behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub units: UnitStrategy,
    pub anomaly_load_threshold_kw: f64,
    /// Explicit chrono format for the combined timestamp; inferred when `None`.
    pub datetime_format: Option<String>,
    pub aliases: ColumnAliases,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            units: UnitStrategy::default(),
            anomaly_load_threshold_kw: DEFAULT_ANOMALY_LOAD_THRESHOLD_KW,
            datetime_format: None,
            aliases: ColumnAliases::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads settings from a JSON file; omitted keys keep their defaults.
    ///
    /// ```json
    /// {
    ///   "units": { "mode": "auto", "threshold": 250.0 },
    ///   "anomaly_load_threshold_kw": 0.05,
    ///   "aliases": { "solar": ["pv_output"] }
    /// }
    /// ```
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// A data row before unit scaling and timestamp parsing.
struct RawRow {
    stamp: String,
    solar: f64,
    storage: f64,
    load: f64,
    extra: Vec<String>,
}

fn field<'a>(record: &'a StringRecord, idx: usize, row: usize) -> Result<&'a str> {
    record.get(idx).ok_or_else(|| {
        PipelineError::MalformedInput(format!("data row {row} has no column {idx}"))
    })
}

/// Cell values read as a missing sample rather than a number.
const MISSING_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A power cell as kW/W, or NaN when the sample is missing.
fn parse_power(record: &StringRecord, idx: usize, row: usize, name: &str) -> Result<f64> {
    let raw = field(record, idx, row)?;
    if MISSING_TOKENS.contains(&raw) {
        return Ok(f64::NAN);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(PipelineError::MalformedInput(format!(
            "data row {row}: {name} value {raw:?} is not a number"
        ))),
    }
}

fn raw_row(record: &StringRecord, columns: &ColumnMap, row: usize) -> Result<RawRow> {
    let stamp = match columns.time {
        TimeColumns::Split { date, time } => {
            combine(field(record, date, row)?, field(record, time, row)?)
        }
        TimeColumns::Combined(idx) => field(record, idx, row)?.to_string(),
    };

    let extra = columns
        .extras
        .iter()
        .map(|(idx, _)| field(record, *idx, row).map(str::to_string))
        .collect::<Result<Vec<_>>>()?;

    Ok(RawRow {
        stamp,
        solar: parse_power(record, columns.solar, row, "solar")?,
        storage: parse_power(record, columns.storage, row, "storage")?,
        load: parse_power(record, columns.load, row, "load")?,
        extra,
    })
}

/// Builds the normalized, sorted and flagged table from raw CSV bytes.
///
/// # Errors
///
/// - [`PipelineError::MalformedInput`] for empty input, ragged rows, invalid
///   UTF-8 or non-numeric power values. Blank and `NA`-style cells are
///   missing samples (NaN), not errors.
/// - [`PipelineError::Schema`] when a required column cannot be found.
/// - [`PipelineError::TimestampParse`] when any row's date + time does not parse.
pub fn load_table(bytes: &[u8], config: &PipelineConfig) -> Result<Table> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(PipelineError::MalformedInput("input is empty".to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    debug!(?headers, "Read CSV headers");

    let columns = resolve_columns(&headers, &config.aliases)?;

    let mut raw_rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        raw_rows.push(raw_row(&record, &columns, i + 1)?);
    }

    let solar: Vec<f64> = raw_rows.iter().map(|r| r.solar).collect();
    let divisor = config.units.divisor(&solar);

    let parser = match (&config.datetime_format, raw_rows.first()) {
        (Some(format), _) => Some(TimestampParser::with_format(format.clone())),
        (None, Some(first)) => Some(TimestampParser::infer(&first.stamp).ok_or_else(|| {
            PipelineError::TimestampParse {
                row: 1,
                value: first.stamp.clone(),
            }
        })?),
        (None, None) => None,
    };

    let mut rows = Vec::with_capacity(raw_rows.len());
    if let Some(parser) = &parser {
        for (i, raw) in raw_rows.into_iter().enumerate() {
            let datetime = parser
                .parse(&raw.stamp)
                .ok_or_else(|| PipelineError::TimestampParse {
                    row: i + 1,
                    value: raw.stamp.clone(),
                })?;

            rows.push(
                Reading::new(
                    datetime,
                    raw.solar / divisor,
                    raw.storage / divisor,
                    raw.load / divisor,
                    config.anomaly_load_threshold_kw,
                )
                .with_extra(raw.extra),
            );
        }
    }

    // stable: samples sharing a timestamp keep their source order
    rows.sort_by_key(|r| r.datetime);

    info!(
        rows = rows.len(),
        divisor,
        format = parser.as_ref().map(TimestampParser::format),
        "Loaded solar table"
    );

    let extra_headers = columns.extras.into_iter().map(|(_, name)| name).collect();
    Ok(Table::new(extra_headers, rows))
}
