//! Export aggregate tables to CSV and the run summary to JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts, and they are deterministic: identical input produces
//! byte-identical files.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{AqiCategory, Season};
use crate::error::AppError;
use crate::stats::{AggregateResult, HeadlineStats};

/// Write one CSV file per aggregate table into `dir`.
pub fn write_tables(dir: &Path, agg: &AggregateResult) -> Result<(), AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::io_write(format!("Failed to create export dir '{}': {e}", dir.display()))
    })?;

    let mut trend = String::from("city,year,mean_pm25\n");
    for point in &agg.trend {
        trend.push_str(&format!("{},{},{:.4}\n", point.city, point.year, point.mean_pm25));
    }
    write_file(&dir.join("trend.csv"), &trend)?;

    let mut seasonal = String::from("season,mean_pm25\n");
    for (season, mean) in &agg.seasonal {
        seasonal.push_str(&format!("{},{mean:.4}\n", season.display_name()));
    }
    write_file(&dir.join("seasonal.csv"), &seasonal)?;

    let mut hourly = String::from("hour,mean_pm25\n");
    for (hour, mean) in &agg.hourly {
        hourly.push_str(&format!("{hour},{mean:.4}\n"));
    }
    write_file(&dir.join("hourly.csv"), &hourly)?;

    let mut comparison = String::from("city,mean_pm25,mean_pm10,mean_no2\n");
    for row in &agg.comparison {
        comparison.push_str(&format!(
            "{},{},{},{}\n",
            row.city,
            fmt_opt(row.pm25),
            fmt_opt(row.pm10),
            fmt_opt(row.no2),
        ));
    }
    write_file(&dir.join("city_comparison.csv"), &comparison)?;

    let mut histogram = String::from("category,count\n");
    for (category, count) in &agg.histogram {
        histogram.push_str(&format!("{},{count}\n", category.display_name()));
    }
    write_file(&dir.join("aqi_histogram.csv"), &histogram)?;

    let mut composition = String::from("pollutant,mean\n");
    for (pollutant, mean) in &agg.composition {
        composition.push_str(&format!("{},{mean:.4}\n", pollutant.display_name()));
    }
    write_file(&dir.join("composition.csv"), &composition)?;

    let mut correlation = String::from("pollutant");
    for label in &agg.correlation.labels {
        correlation.push(',');
        correlation.push_str(label);
    }
    correlation.push('\n');
    for (label, row) in agg.correlation.labels.iter().zip(&agg.correlation.values) {
        correlation.push_str(label);
        for value in row {
            correlation.push(',');
            correlation.push_str(&fmt_opt(*value));
        }
        correlation.push('\n');
    }
    write_file(&dir.join("correlation.csv"), &correlation)?;

    if !agg.stations.is_empty() {
        let mut stations = String::from("station,mean_pm25\n");
        for (station, mean) in &agg.stations {
            stations.push_str(&format!("{station},{mean:.4}\n"));
        }
        write_file(&dir.join("stations.csv"), &stations)?;
    }

    Ok(())
}

/// Portable JSON summary of a run (headline stats + the small tables).
#[derive(Debug, Serialize)]
pub struct SummaryFile {
    pub tool: String,
    pub headline: HeadlineStats,
    pub histogram: Vec<HistogramEntry>,
    pub seasonal: Vec<SeasonalEntry>,
}

#[derive(Debug, Serialize)]
pub struct HistogramEntry {
    pub category: AqiCategory,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SeasonalEntry {
    pub season: Season,
    pub mean_pm25: f64,
}

/// Write the JSON summary file.
pub fn write_summary_json(path: &Path, agg: &AggregateResult) -> Result<(), AppError> {
    let summary = SummaryFile {
        tool: "aqdash".to_string(),
        headline: agg.headline.clone(),
        histogram: agg
            .histogram
            .iter()
            .map(|&(category, count)| HistogramEntry { category, count })
            .collect(),
        seasonal: agg
            .seasonal
            .iter()
            .map(|&(season, mean_pm25)| SeasonalEntry { season, mean_pm25 })
            .collect(),
    };

    let file = File::create(path).map_err(|e| {
        AppError::io_write(format!("Failed to create summary JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(file, &summary)
        .map_err(|e| AppError::io_write(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => String::new(),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io_write(format!("Failed to create export '{}': {e}", path.display()))
    })?;
    file.write_all(contents.as_bytes()).map_err(|e| {
        AppError::io_write(format!("Failed to write export '{}': {e}", path.display()))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pollutant, Reading, ReportConfig};
    use crate::stats::aggregate;
    use chrono::NaiveDate;

    fn sample_aggregates() -> AggregateResult {
        let mut values = [None; Pollutant::COUNT];
        values[Pollutant::Pm25.index()] = Some(90.0);
        values[Pollutant::Pm10.index()] = Some(150.0);
        let daily = vec![
            Reading {
                city: "Delhi".to_string(),
                station: None,
                datetime: NaiveDate::from_ymd_opt(2020, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                values,
                aqi: None,
            },
            Reading {
                city: "Mumbai".to_string(),
                station: None,
                datetime: NaiveDate::from_ymd_opt(2020, 7, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                values: {
                    let mut v = [None; Pollutant::COUNT];
                    v[Pollutant::Pm25.index()] = Some(45.0);
                    v[Pollutant::Pm10.index()] = Some(80.0);
                    v
                },
                aqi: None,
            },
        ];
        let config = ReportConfig {
            daily_csv: "city_day.csv".into(),
            hourly_csv: None,
            station_csv: None,
            out_path: "dashboard.html".into(),
            title: "t".to_string(),
            focus_city: "Delhi".to_string(),
            top_trend: 8,
            top_compare: 12,
            trim_quantile: None,
            export_tables: None,
            export_summary: None,
        };
        aggregate(&daily, &[], &[], &config)
    }

    #[test]
    fn exports_are_byte_identical_across_runs() {
        let base = std::env::temp_dir().join(format!("aqdash-export-{}", std::process::id()));
        let dir_a = base.join("a");
        let dir_b = base.join("b");

        let agg = sample_aggregates();
        write_tables(&dir_a, &agg).unwrap();
        write_tables(&dir_b, &agg).unwrap();

        for name in [
            "trend.csv",
            "seasonal.csv",
            "hourly.csv",
            "city_comparison.csv",
            "aqi_histogram.csv",
            "composition.csv",
            "correlation.csv",
        ] {
            let a = std::fs::read(dir_a.join(name)).unwrap();
            let b = std::fs::read(dir_b.join(name)).unwrap();
            assert_eq!(a, b, "{name} differs between runs");
        }

        std::fs::remove_dir_all(&base).ok();
    }

    #[test]
    fn histogram_export_lists_all_bands() {
        let base = std::env::temp_dir().join(format!("aqdash-hist-{}", std::process::id()));
        let agg = sample_aggregates();
        write_tables(&base, &agg).unwrap();

        let histogram = std::fs::read_to_string(base.join("aqi_histogram.csv")).unwrap();
        assert!(histogram.starts_with("category,count\n"));
        // Both rows resolve a band from PM2.5; counts sum to 2.
        let total: usize = histogram
            .lines()
            .skip(1)
            .map(|line| line.rsplit(',').next().unwrap().parse::<usize>().unwrap())
            .sum();
        assert_eq!(total, 2);

        std::fs::remove_dir_all(&base).ok();
    }
}
