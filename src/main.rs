//! CLI entry point for the solar performance dashboard.
//!
//! Loads a solar/storage/load CSV from a file or URL, applies date and flag
//! filters, and prints KPIs, anomaly records, chart series or CSV exports.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use solar_dash::{
    cache::DEFAULT_TTL,
    dashboard::Dashboard,
    fetch::{BasicClient, BearerAuth, HttpClient},
    filter::Filter,
    output::{export_csv, print_pretty, render_kpis, write_csv},
    pipeline::PipelineConfig,
    reading::{AnomalyFlag, SystemStatus},
    series::melt,
    source::{DEFAULT_SOURCE, Source},
    units::UnitStrategy,
};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "solar_dash")]
#[command(about = "Solar, storage and load performance from a CSV", long_about = None)]
struct Cli {
    /// Path or URL of the solar CSV
    #[arg(short, long, global = true, env = "SOLAR_DASH_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// JSON file with pipeline settings; flags below override it
    #[arg(short, long, global = true, env = "SOLAR_DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Power units in the source: auto, kw or w [default: auto]
    #[arg(long, global = true, env = "SOLAR_DASH_UNITS")]
    units: Option<UnitStrategy>,

    /// In auto mode, max solar above this means the file is in watts [default: 100]
    #[arg(long, global = true, env = "SOLAR_DASH_UNIT_THRESHOLD")]
    unit_threshold: Option<f64>,

    /// Load (kW) above which a sample with no solar or storage is abnormal [default: 0.01]
    #[arg(long, global = true, env = "SOLAR_DASH_ANOMALY_THRESHOLD")]
    anomaly_threshold: Option<f64>,

    /// chrono format of "<date> <time>"; inferred from the first row when omitted
    #[arg(long, global = true, env = "SOLAR_DASH_DATETIME_FORMAT")]
    datetime_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// First date to include (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// System statuses to keep, comma separated (running, shutdown)
    #[arg(long, value_delimiter = ',')]
    status: Vec<SystemStatus>,

    /// Anomaly flags to keep, comma separated (normal, abnormal)
    #[arg(long, value_delimiter = ',')]
    anomaly: Vec<AnomalyFlag>,
}

impl FilterArgs {
    fn to_filter(&self) -> Filter {
        Filter {
            start_date: self.start,
            end_date: self.end,
            statuses: (!self.status.is_empty()).then(|| self.status.iter().copied().collect()),
            anomalies: (!self.anomaly.is_empty()).then(|| self.anomaly.iter().copied().collect()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs and the anomaly records for the selection
    Summary {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the summary as JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write the abnormal rows of the selection to stdout as CSV
    Anomalies {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export the selection (or the full table) as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Export every row, ignoring filters
        #[arg(long, default_value_t = false)]
        full: bool,

        /// Output file (defaults to filtered_solar_data.csv or full_solar_data.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Emit long-format chart series as JSON
    Chart {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/solar_dash.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("solar_dash.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = pipeline_config(&cli)?;
    let source = Source::parse(&cli.source);

    match std::env::var("SOLAR_DASH_TOKEN") {
        Ok(token) if !token.trim().is_empty() => {
            let client = BearerAuth::new(BasicClient::new(), &token)?;
            run(Dashboard::new(client, source, config, DEFAULT_TTL), cli.command).await
        }
        _ => run(Dashboard::new(BasicClient::new(), source, config, DEFAULT_TTL), cli.command).await,
    }
}

/// Settings from `--config` (or defaults) with command-line overrides applied.
fn pipeline_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(units) = cli.units {
        config.units = units;
    }
    if let Some(threshold) = cli.unit_threshold {
        config.units = config.units.with_threshold(threshold);
    }
    if let Some(threshold) = cli.anomaly_threshold {
        config.anomaly_load_threshold_kw = threshold;
    }
    if let Some(format) = &cli.datetime_format {
        config.datetime_format = Some(format.clone());
    }

    info!(units = ?config.units, anomaly_threshold = config.anomaly_load_threshold_kw, "Pipeline settings");
    Ok(config)
}

/// Executes one subcommand against `dash`.
#[tracing::instrument(skip_all, fields(source = %dash.source()))]
async fn run<C: HttpClient>(dash: Dashboard<C>, command: Commands) -> Result<()> {
    match command {
        Commands::Summary { filter, json } => {
            let view = dash.query(&filter.to_filter()).await?;
            print_pretty(&view.summary);

            let mut out = std::io::stdout().lock();
            if json {
                serde_json::to_writer_pretty(&mut out, &view.summary)?;
                writeln!(out)?;
            } else {
                write!(out, "{}", render_kpis(&view.summary))?;
                writeln!(out)?;
                if view.anomalies.is_empty() {
                    writeln!(out, "No anomalies detected during the selected period.")?;
                } else {
                    writeln!(out, "Anomaly records ({}):", view.anomalies.len())?;
                    write_csv(&view.anomalies, &mut out)?;
                }
            }
        }
        Commands::Anomalies { filter } => {
            let view = dash.query(&filter.to_filter()).await?;
            info!(anomalies = view.anomalies.len(), "Writing anomaly records");
            write_csv(&view.anomalies, std::io::stdout().lock())?;
        }
        Commands::Export {
            filter,
            full,
            output,
        } => {
            let (table, default_name) = if full {
                ((*dash.load().await?).clone(), "full_solar_data.csv")
            } else {
                let view = dash.query(&filter.to_filter()).await?;
                (view.filtered, "filtered_solar_data.csv")
            };
            let path = output.unwrap_or_else(|| PathBuf::from(default_name));
            export_csv(&table, &path)?;
        }
        Commands::Chart { filter, output } => {
            let view = dash.query(&filter.to_filter()).await?;
            let points = melt(&view.filtered);
            info!(points = points.len(), "Writing chart series");

            match output {
                Some(path) => {
                    let mut writer = BufWriter::new(File::create(&path)?);
                    serde_json::to_writer_pretty(&mut writer, &points)?;
                    writer.flush()?;
                }
                None => {
                    let mut out = std::io::stdout().lock();
                    serde_json::to_writer_pretty(&mut out, &points)?;
                    writeln!(out)?;
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_filter_args_parse() {
        let cli = Cli::try_parse_from([
            "solar_dash",
            "--source",
            "data.csv",
            "summary",
            "--start",
            "2025-09-28",
            "--status",
            "running,shutdown",
            "--anomaly",
            "abnormal",
        ])
        .unwrap();

        assert_eq!(Source::parse(&cli.source), Source::Path(PathBuf::from("data.csv")));
        let Commands::Summary { filter, json } = cli.command else {
            panic!("expected summary");
        };
        assert!(!json);

        let f = filter.to_filter();
        assert_eq!(f.start_date, NaiveDate::from_ymd_opt(2025, 9, 28));
        assert_eq!(f.end_date, None);
        assert_eq!(f.statuses.map(|s| s.len()), Some(2));
        assert_eq!(
            f.anomalies.map(|a| a.into_iter().collect::<Vec<_>>()),
            Some(vec![AnomalyFlag::Abnormal])
        );
    }

    #[test]
    fn test_empty_filter_args_select_everything() {
        assert_eq!(FilterArgs::default().to_filter(), Filter::default());
    }

    #[test]
    fn test_units_flag() {
        let cli = Cli::try_parse_from(["solar_dash", "--units", "kw", "export", "--full"]).unwrap();
        assert_eq!(cli.units, Some(UnitStrategy::Kilowatts));
        assert!(matches!(cli.command, Commands::Export { full: true, .. }));
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "solar_dash",
            "--unit-threshold",
            "500",
            "--anomaly-threshold",
            "0.2",
            "chart",
        ])
        .unwrap();

        let config = pipeline_config(&cli).unwrap();
        assert_eq!(config.units, UnitStrategy::Auto { threshold: 500.0 });
        assert_eq!(config.anomaly_load_threshold_kw, 0.2);
    }
}
