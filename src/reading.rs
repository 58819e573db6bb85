//! Normalized sample rows and the flags derived from them.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

/// Default load (kW) above which a sample with no generation is abnormal.
pub const DEFAULT_ANOMALY_LOAD_THRESHOLD_KW: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemStatus {
    Running,
    Shutdown,
}

impl SystemStatus {
    pub const ALL: [SystemStatus; 2] = [SystemStatus::Running, SystemStatus::Shutdown];

    /// `Shutdown` iff all three readings are exactly zero.
    pub fn classify(solar_kw: f64, storage_kw: f64, load_kw: f64) -> Self {
        if solar_kw == 0.0 && storage_kw == 0.0 && load_kw == 0.0 {
            SystemStatus::Shutdown
        } else {
            SystemStatus::Running
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Running => "Running",
            SystemStatus::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(SystemStatus::Running),
            "shutdown" => Ok(SystemStatus::Shutdown),
            other => Err(format!("unknown system status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnomalyFlag {
    Normal,
    Abnormal,
}

impl AnomalyFlag {
    pub const ALL: [AnomalyFlag; 2] = [AnomalyFlag::Normal, AnomalyFlag::Abnormal];

    /// `Abnormal` when load is drawn with neither solar nor storage contributing.
    pub fn classify(solar_kw: f64, storage_kw: f64, load_kw: f64, load_threshold_kw: f64) -> Self {
        if solar_kw == 0.0 && storage_kw == 0.0 && load_kw > load_threshold_kw {
            AnomalyFlag::Abnormal
        } else {
            AnomalyFlag::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyFlag::Normal => "Normal",
            AnomalyFlag::Abnormal => "Abnormal",
        }
    }
}

impl fmt::Display for AnomalyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(AnomalyFlag::Normal),
            "abnormal" => Ok(AnomalyFlag::Abnormal),
            other => Err(format!("unknown anomaly flag '{other}'")),
        }
    }
}

/// One timestamped sample after unit normalization and flagging.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub datetime: NaiveDateTime,
    pub solar_kw: f64,
    pub storage_kw: f64,
    pub load_kw: f64,
    pub system_status: SystemStatus,
    pub anomaly_flag: AnomalyFlag,

    // values of non-canonical source columns, aligned with `Table::extra_headers`
    pub extra: Vec<String>,
}

impl Reading {
    /// Builds a reading and derives both flags from the power values alone.
    pub fn new(
        datetime: NaiveDateTime,
        solar_kw: f64,
        storage_kw: f64,
        load_kw: f64,
        anomaly_load_threshold_kw: f64,
    ) -> Self {
        Reading {
            datetime,
            solar_kw,
            storage_kw,
            load_kw,
            system_status: SystemStatus::classify(solar_kw, storage_kw, load_kw),
            anomaly_flag: AnomalyFlag::classify(
                solar_kw,
                storage_kw,
                load_kw,
                anomaly_load_threshold_kw,
            ),
            extra: Vec::new(),
        }
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }
}

/// An ordered set of readings plus the names of any carried-over columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub extra_headers: Vec<String>,
    pub rows: Vec<Reading>,
}

impl Table {
    pub fn new(extra_headers: Vec<String>, rows: Vec<Reading>) -> Self {
        Table { extra_headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A table with the same columns holding only the rows matching `keep`.
    pub fn select<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Reading) -> bool,
    {
        Table {
            extra_headers: self.extra_headers.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
