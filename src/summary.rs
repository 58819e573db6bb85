//! KPI aggregates over a (possibly filtered) table.
//!
//! Missing samples (NaN) are skipped by every sum, so totals stay finite.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::reading::{AnomalyFlag, Table};

/// Column sums over a table. Samples are summed as-is and reported as kWh,
/// matching the dashboard's KPI cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub load_kwh: f64,
    pub solar_kwh: f64,
    pub storage_kwh: f64,
}

/// `value`, or 0 for a missing sample.
fn present(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

impl Totals {
    pub fn of(table: &Table) -> Self {
        table.rows.iter().fold(Totals::default(), |acc, r| Totals {
            load_kwh: acc.load_kwh + present(r.load_kw),
            solar_kwh: acc.solar_kwh + present(r.solar_kw),
            storage_kwh: acc.storage_kwh + present(r.storage_kw),
        })
    }
}

/// Summed `load_kw` per calendar date, in ascending date order.
pub fn daily_load(table: &Table) -> BTreeMap<NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for r in &table.rows {
        *days.entry(r.datetime.date()).or_insert(0.0) += present(r.load_kw);
    }
    days
}

/// Date with the highest summed load; the earliest date wins ties.
pub fn peak_load_day(table: &Table) -> Option<NaiveDate> {
    let mut peak: Option<(NaiveDate, f64)> = None;
    for (day, load) in daily_load(table) {
        match peak {
            Some((_, best)) if load <= best => {}
            _ => peak = Some((day, load)),
        }
    }
    peak.map(|(day, _)| day)
}

/// The abnormal rows of `table`.
pub fn anomalies(table: &Table) -> Table {
    table.select(|r| r.anomaly_flag == AnomalyFlag::Abnormal)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub totals: Totals,
    pub peak_load_day: Option<NaiveDate>,
    pub anomalies: usize,
}

impl Summary {
    pub fn of(table: &Table) -> Self {
        Summary {
            rows: table.len(),
            first: table.rows.iter().map(|r| r.datetime).min(),
            last: table.rows.iter().map(|r| r.datetime).max(),
            totals: Totals::of(table),
            peak_load_day: peak_load_day(table),
            anomalies: table
                .rows
                .iter()
                .filter(|r| r.anomaly_flag == AnomalyFlag::Abnormal)
                .count(),
        }
    }
}
