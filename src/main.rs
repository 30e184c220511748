use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spanwatch::{load_settings, CsvSource, Overrides, RowSource};
use spanwatch_core::{AnalysisConfig, Pipeline};
use spanwatch_export::{write_reports, Report};
use spanwatch_types::{Interval, Severity, Summary};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "spanwatch", version)]
#[command(about = "Analyze optical span PM telemetry: continuity, KPIs and threshold alerts")]
struct Args {
    /// CSV files or directories of CSV files to analyze
    #[arg(short, long, num_args = 1.., value_name = "PATH")]
    input: Vec<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Reindex each span onto its nominal sampling grid
    #[arg(long, global = true)]
    resample: bool,

    /// Gap tolerance as a multiple of the nominal interval (e.g., 1.5)
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Fixed sampling interval instead of inferring it (e.g., "15m", "60s")
    #[arg(long, global = true, value_parser = parse_interval)]
    expected_interval: Option<Interval>,

    /// Worker threads for per-span analysis
    #[arg(long, global = true)]
    parallelism: Option<usize>,

    /// Also write Prometheus exposition text to prom_metrics.txt
    #[arg(long)]
    prometheus: bool,

    /// Metric name prefix for the Prometheus output
    #[arg(long, requires = "prometheus")]
    namespace: Option<String>,

    /// Logging verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration, print the effective values and exit
    CheckConfig,
}

/// Name of the run log written into the output directory.
const LOG_FILE_NAME: &str = "analyzer.log";

fn parse_interval(s: &str) -> Result<Interval, String> {
    Interval::parse(s).map_err(|e| e.to_string())
}

/// Open `<output_dir>/analyzer.log` for appending, creating the directory.
fn open_log_file(output_dir: &Path) -> Result<File> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(LOG_FILE_NAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))
}

/// Log to stderr, and to `file` without ANSI colors when given.
fn init_logging(level: &str, file: Option<File>) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level: {}", level))?;
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Analysis runs also log to a file next to their reports.
    let log_file = match (&args.command, args.input.is_empty()) {
        (None, false) => Some(open_log_file(&args.output_dir)?),
        _ => None,
    };
    init_logging(&args.log_level, log_file)?;

    let overrides = Overrides {
        resample: args.resample,
        gap_tolerance: args.tolerance,
        expected_interval: args.expected_interval,
        parallelism: args.parallelism,
    };
    let config = load_settings(args.config.as_deref(), &overrides).with_context(|| {
        match &args.config {
            Some(path) => format!("loading config from {}", path.display()),
            None => "loading config from environment".to_string(),
        }
    })?;

    if let Some(Command::CheckConfig) = args.command {
        return check_config(config);
    }

    if args.input.is_empty() {
        anyhow::bail!("--input is required (use --help for usage)");
    }

    let pipeline = Pipeline::new(config).context("invalid configuration")?;

    let mut source = CsvSource::open(&args.input).context("resolving input paths")?;
    tracing::info!(source = source.description(), "reading telemetry");
    let batch = source
        .read()
        .with_context(|| format!("reading {}", source.description()))?;

    let summary = pipeline.run(&batch).context("analysis failed")?;

    let mut reports = Report::standard();
    if args.prometheus {
        reports.push(Report::Prometheus {
            namespace: args.namespace.clone(),
        });
    }
    let written = write_reports(&summary, &args.output_dir, &reports)
        .with_context(|| format!("writing reports to {}", args.output_dir.display()))?;

    print_report(&summary);
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Validate a loaded configuration and print it as JSON.
fn check_config(config: AnalysisConfig) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let json = serde_json::to_string_pretty(&config)?;
    println!("{}", json);
    tracing::info!(rules = config.alert_rules.len(), "configuration is valid");
    Ok(())
}

fn print_report(summary: &Summary) {
    let diag = &summary.diagnostics;
    println!(
        "Analyzed {} spans, {} records ({} to {})",
        summary.span_count,
        summary.total_records,
        summary.run_time_range.start.to_rfc3339(),
        summary.run_time_range.end.to_rfc3339(),
    );
    println!(
        "Gaps: {} ({} missing samples)",
        summary.gaps.len(),
        summary.total_missing()
    );
    println!(
        "Alerts: {} critical, {} warning",
        summary.alert_count(Severity::Critical),
        summary.alert_count(Severity::Warning)
    );
    if !diag.is_clean() {
        println!(
            "Repairs: {} rows without span, {} bad timestamps, {} bad metric cells, {} duplicates, {} dropped spans",
            diag.rows_missing_span,
            diag.timestamp_parse_errors,
            diag.metric_parse_errors,
            diag.duplicates_removed,
            diag.dropped_spans.len()
        );
    }
}
