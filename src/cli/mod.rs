//! Command-line parsing for the dashboard generator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the ingest/aggregation code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "aqdash", version, about = "Air-quality dashboard generator (static HTML)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the CSVs, compute aggregates, and write the HTML dashboard.
    ///
    /// This is the default: a bare `aqdash` behaves like `aqdash report`.
    Report(ReportArgs),
    /// Print the aggregate summary to the terminal without writing HTML.
    Stats(ReportArgs),
}

/// Common options for both subcommands.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Daily readings CSV. Defaults to $AQDASH_DAILY_CSV, then city_day.csv.
    #[arg(long)]
    pub daily: Option<PathBuf>,

    /// Hourly readings CSV for the hourly-pattern chart (optional).
    #[arg(long)]
    pub hourly: Option<PathBuf>,

    /// Station-level readings CSV for the station chart (optional).
    #[arg(long)]
    pub stations: Option<PathBuf>,

    /// Output HTML path. Defaults to $AQDASH_OUT, then dashboard.html.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,

    /// Report title.
    #[arg(long, default_value = "Air Quality Analysis Dashboard")]
    pub title: String,

    /// City used for the hourly-pattern and station charts.
    #[arg(long, default_value = "Delhi")]
    pub focus_city: String,

    /// How many cities to draw on the yearly trend chart.
    #[arg(long, default_value_t = 8)]
    pub top_trend: usize,

    /// How many cities to include in the comparison chart.
    #[arg(long, default_value_t = 12)]
    pub top_compare: usize,

    /// Per-pollutant upper-quantile outlier trim.
    #[arg(long, default_value_t = 0.99)]
    pub trim_quantile: f64,

    /// Disable outlier trimming.
    #[arg(long)]
    pub no_trim: bool,

    /// Export aggregate tables as CSV files into this directory.
    #[arg(long)]
    pub export_tables: Option<PathBuf>,

    /// Export a JSON run summary to this path.
    #[arg(long)]
    pub export_summary: Option<PathBuf>,
}
