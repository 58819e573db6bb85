//! Long-format series for line charts: one point per (sample, parameter).

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::reading::{Reading, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    SolarKw,
    StorageKw,
    LoadKw,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [Parameter::SolarKw, Parameter::StorageKw, Parameter::LoadKw];

    fn value(&self, r: &Reading) -> f64 {
        match self {
            Parameter::SolarKw => r.solar_kw,
            Parameter::StorageKw => r.storage_kw,
            Parameter::LoadKw => r.load_kw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub datetime: NaiveDateTime,
    pub parameter: Parameter,
    pub kw: f64,
}

/// Stacks the three power columns: every solar point, then storage, then load.
pub fn melt(table: &Table) -> Vec<ChartPoint> {
    Parameter::ALL
        .iter()
        .flat_map(|p| {
            table.rows.iter().map(move |r| ChartPoint {
                datetime: r.datetime,
                parameter: *p,
                kw: p.value(r),
            })
        })
        .collect()
}
