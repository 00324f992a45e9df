//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves `.env` defaults
//! - runs the ingest/aggregate/render pipeline
//! - prints the terminal summary
//! - writes the HTML dashboard and optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, ReportArgs};
use crate::domain::ReportConfig;
use crate::error::AppError;
use crate::io::ingest::normalize_city;

pub mod pipeline;

/// Entry point for the `aqdash` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` values act as defaults for the input/output paths.
    dotenvy::dotenv().ok();

    // We want a bare `aqdash` (and `aqdash --daily foo.csv`) to behave like
    // `aqdash report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Stats(args) => handle_stats(args),
    }
}

fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let passthrough = ["report", "stats", "help", "-h", "--help", "-V", "--version"];
    let needs_default = match argv.get(1).map(String::as_str) {
        None => true,
        Some(first) => !passthrough.contains(&first),
    };
    if needs_default {
        argv.insert(1, "report".to_string());
    }
    argv
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let config = report_config_from_args(&args);
    let run = pipeline::run_aggregation(&config)?;
    let figures = pipeline::build_figures(&run.aggregates, &config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.daily,
            run.hourly.as_ref(),
            run.stations.as_ref(),
            &run.aggregates,
            &config,
        )
    );

    crate::report::write_report(&config.out_path, &run.aggregates, &figures, &config)?;

    // Optional exports.
    if let Some(dir) = &config.export_tables {
        crate::io::export::write_tables(dir, &run.aggregates)?;
    }
    if let Some(path) = &config.export_summary {
        crate::io::export::write_summary_json(path, &run.aggregates)?;
    }

    println!(
        "Dashboard written to {} ({} chart(s)).",
        config.out_path.display(),
        figures.len()
    );
    Ok(())
}

fn handle_stats(args: ReportArgs) -> Result<(), AppError> {
    let config = report_config_from_args(&args);
    let run = pipeline::run_aggregation(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(
            &run.daily,
            run.hourly.as_ref(),
            run.stations.as_ref(),
            &run.aggregates,
            &config,
        )
    );
    Ok(())
}

/// Resolve the run configuration: CLI flags win, environment fills the gaps,
/// then the fixed defaults.
pub fn report_config_from_args(args: &ReportArgs) -> ReportConfig {
    let env_path = |key: &str| std::env::var_os(key).map(PathBuf::from);

    ReportConfig {
        daily_csv: args
            .daily
            .clone()
            .or_else(|| env_path("AQDASH_DAILY_CSV"))
            .unwrap_or_else(|| PathBuf::from("city_day.csv")),
        hourly_csv: args.hourly.clone().or_else(|| env_path("AQDASH_HOURLY_CSV")),
        station_csv: args.stations.clone().or_else(|| env_path("AQDASH_STATION_CSV")),
        out_path: args
            .out
            .clone()
            .or_else(|| env_path("AQDASH_OUT"))
            .unwrap_or_else(|| PathBuf::from("dashboard.html")),
        title: args.title.clone(),
        focus_city: normalize_city(&args.focus_city),
        top_trend: args.top_trend,
        top_compare: args.top_compare,
        trim_quantile: if args.no_trim {
            None
        } else {
            Some(args.trim_quantile)
        },
        export_tables: args.export_tables.clone(),
        export_summary: args.export_summary.clone(),
    }
}
