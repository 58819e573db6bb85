//! Output formatting and persistence for solar tables.
//!
//! Debug logging of summaries, KPI rendering and CSV export.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::reading::Table;
use crate::summary::Summary;

/// Leading columns of every export, before any carried-over source columns.
pub const EXPORT_COLUMNS: [&str; 6] = [
    "datetime",
    "solar_kw",
    "storage_kw",
    "load_kw",
    "system_status",
    "anomaly_flag",
];

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Logs a summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &Summary) {
    debug!("{:#?}", summary);
}

/// Formats `value` with two decimals and comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Renders the four KPI cards as aligned text lines.
pub fn render_kpis(summary: &Summary) -> String {
    let peak = summary
        .peak_load_day
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    [
        (
            "Total Load Consumption (kWh)",
            format_thousands(summary.totals.load_kwh),
        ),
        (
            "Total Solar Production (kWh)",
            format_thousands(summary.totals.solar_kwh),
        ),
        (
            "Total Storage Production (kWh)",
            format_thousands(summary.totals.storage_kwh),
        ),
        ("Peak Load Day", peak),
    ]
    .iter()
    .map(|(label, value)| format!("{label:<32}{value:>16}\n"))
    .collect()
}

/// Writes `table` as CSV: the export columns, then any extra columns.
pub fn write_csv(table: &Table, writer: impl Write) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(writer);

    let header = EXPORT_COLUMNS
        .iter()
        .copied()
        .chain(table.extra_headers.iter().map(String::as_str));
    wtr.write_record(header)?;

    for r in &table.rows {
        let mut record = vec![
            r.datetime.format(DATETIME_FORMAT).to_string(),
            r.solar_kw.to_string(),
            r.storage_kw.to_string(),
            r.load_kw.to_string(),
            r.system_status.to_string(),
            r.anomaly_flag.to_string(),
        ];
        record.extend(r.extra.iter().cloned());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Encodes `table` as UTF-8 CSV bytes.
pub fn to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// Writes `table` to a CSV file at `path`, replacing any existing file.
pub fn export_csv(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file))?;
    info!(path = %path.display(), rows = table.len(), "Exported CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::Reading;
    use chrono::NaiveDate;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_table() -> Table {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 15, 0)
            .unwrap();
        Table::new(
            vec!["site".to_string()],
            vec![Reading::new(dt, 0.0, 0.0, 5.0, 0.01).with_extra(vec!["north".to_string()])],
        )
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&Summary::of(&Table::default()));
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0.00");
        assert_eq!(format_thousands(999.999), "1,000.00");
        assert_eq!(format_thousands(1234567.891), "1,234,567.89");
        assert_eq!(format_thousands(-1234.5), "-1,234.50");
        assert_eq!(format_thousands(-0.001), "0.00");
    }

    #[test]
    fn test_render_kpis_without_peak_day() {
        let text = render_kpis(&Summary::of(&Table::default()));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Total Load Consumption (kWh)"));
        assert!(lines[0].ends_with("0.00"));
        assert!(lines[3].ends_with('-'));
    }

    #[test]
    fn test_to_csv_layout() {
        let csv = String::from_utf8(to_csv(&sample_table()).unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "datetime,solar_kw,storage_kw,load_kw,system_status,anomaly_flag,site"
        );
        assert_eq!(lines[1], "2025-01-01 00:15:00,0,0,5,Running,Abnormal,north");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_to_csv_empty_table_has_header() {
        let csv = String::from_utf8(to_csv(&Table::default()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "datetime,solar_kw,storage_kw,load_kw,system_status,anomaly_flag\n"
        );
    }

    #[test]
    fn test_export_csv_creates_file() {
        let path = temp_path("solar_dash_test_export.csv");
        let _ = fs::remove_file(&path);

        export_csv(&sample_table(), Path::new(&path)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_export_csv_overwrites() {
        let path = temp_path("solar_dash_test_overwrite.csv");
        export_csv(&sample_table(), Path::new(&path)).unwrap();
        export_csv(&Table::default(), Path::new(&path)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);

        fs::remove_file(&path).unwrap();
    }
}
