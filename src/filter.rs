//! Row selection by date range and flag membership.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::reading::{AnomalyFlag, Reading, SystemStatus, Table};

/// Independent predicates, ANDed together. `None` means "no constraint";
/// an explicitly empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub statuses: Option<BTreeSet<SystemStatus>>,
    pub anomalies: Option<BTreeSet<AnomalyFlag>>,
}

impl Filter {
    /// The widest explicit filter for `table`: its first and last dates and
    /// every status and flag that occurs in it.
    pub fn covering(table: &Table) -> Self {
        Filter {
            start_date: table.rows.first().map(|r| r.datetime.date()),
            end_date: table.rows.last().map(|r| r.datetime.date()),
            statuses: Some(table.rows.iter().map(|r| r.system_status).collect()),
            anomalies: Some(table.rows.iter().map(|r| r.anomaly_flag).collect()),
        }
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        let date = reading.datetime.date();
        self.start_date.is_none_or(|start| start <= date)
            && self.end_date.is_none_or(|end| date <= end)
            && self
                .statuses
                .as_ref()
                .is_none_or(|s| s.contains(&reading.system_status))
            && self
                .anomalies
                .as_ref()
                .is_none_or(|a| a.contains(&reading.anomaly_flag))
    }
}

/// Returns a new table with the rows of `table` that match `filter`.
pub fn filter(table: &Table, filter: &Filter) -> Table {
    table.select(|r| filter.matches(r))
}
