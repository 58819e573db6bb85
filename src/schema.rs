//! Header normalization and resolution of the required columns.
//!
//! Headers are matched on their letters and digits only, so
//! `Solar Production (kW)`, `solar-production-kw` and `SOLAR_PRODUCTION[KW]`
//! all name the same column. Carried-over columns keep the friendlier
//! [`normalize_header`] form.

use serde::Deserialize;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Columns the pipeline derives itself; input copies are dropped.
const DERIVED_COLUMNS: &[&str] = &["systemstatus", "anomalyflag"];

/// Known header spellings for each semantic field, checked in order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub date: Vec<String>,
    pub time: Vec<String>,
    pub datetime: Vec<String>,
    pub solar: Vec<String>,
    pub storage: Vec<String>,
    pub load: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        ColumnAliases {
            date: owned(&["date", "day"]),
            time: owned(&["time", "time_of_day"]),
            datetime: owned(&["datetime", "date_time", "timestamp"]),
            solar: owned(&[
                "solar_kw",
                "solar_production(kw)",
                "solar_production_kw",
                "solar_production",
                "solar_production(w)",
                "solar",
                "pv_kw",
            ]),
            storage: owned(&[
                "storage_kw",
                "storage_production(kw)",
                "storage_production_kw",
                "storage_production",
                "storage_production(w)",
                "storage",
                "battery_kw",
            ]),
            load: owned(&[
                "load_kw",
                "load_consumption(kw)",
                "load_consumption_kw",
                "load_consumption",
                "load_consumption(w)",
                "load",
                "consumption_kw",
            ]),
        }
    }
}

/// Where the timestamp comes from in the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeColumns {
    Split { date: usize, time: usize },
    Combined(usize),
}

/// Column indices of every required field plus the carried-over extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub time: TimeColumns,
    pub solar: usize,
    pub storage: usize,
    pub load: usize,
    /// `(source index, normalized header)` for every other column, in source order.
    pub extras: Vec<(usize, String)>,
}

/// Trims, lowercases and joins whitespace-separated words with `_`.
pub fn normalize_header(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Lowercased letters and digits of `raw`; case, spacing and punctuation drop out.
pub fn match_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Index of the first header matching the earliest alias in `aliases`.
fn find(keys: &[String], aliases: &[String]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        let alias = match_key(alias);
        keys.iter().position(|k| *k == alias)
    })
}

/// Resolves the required columns from the source headers.
///
/// # Errors
///
/// Returns [`PipelineError::Schema`] naming every field without a match.
pub fn resolve_columns(headers: &[String], aliases: &ColumnAliases) -> Result<ColumnMap> {
    let keys: Vec<String> = headers.iter().map(|h| match_key(h)).collect();
    let date = find(&keys, &aliases.date);
    let time = find(&keys, &aliases.time);
    let combined = find(&keys, &aliases.datetime);
    let solar = find(&keys, &aliases.solar);
    let storage = find(&keys, &aliases.storage);
    let load = find(&keys, &aliases.load);

    let mut missing = Vec::new();
    let time_columns = match (date, time, combined) {
        (Some(date), Some(time), _) => Some(TimeColumns::Split { date, time }),
        (_, _, Some(idx)) => Some(TimeColumns::Combined(idx)),
        (date, time, None) => {
            if date.is_none() {
                missing.push("date".to_string());
            }
            if time.is_none() {
                missing.push("time".to_string());
            }
            None
        }
    };
    if solar.is_none() {
        missing.push("solar".to_string());
    }
    if storage.is_none() {
        missing.push("storage".to_string());
    }
    if load.is_none() {
        missing.push("load".to_string());
    }

    let (Some(time), Some(solar), Some(storage), Some(load)) = (time_columns, solar, storage, load)
    else {
        return Err(PipelineError::Schema { missing });
    };

    let used: Vec<usize> = match time {
        TimeColumns::Split { date, time } => vec![date, time, solar, storage, load],
        TimeColumns::Combined(idx) => vec![idx, solar, storage, load],
    };

    let extras = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            !used.contains(idx) && !DERIVED_COLUMNS.contains(&keys[*idx].as_str())
        })
        .map(|(idx, name)| (idx, name.clone()))
        .collect::<Vec<_>>();

    debug!(?time, solar, storage, load, extras = extras.len(), "Resolved columns");

    Ok(ColumnMap {
        time,
        solar,
        storage,
        load,
        extras,
    })
}
