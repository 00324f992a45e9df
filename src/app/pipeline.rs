//! Shared report pipeline used by both subcommands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> aggregation -> chart specs -> figures
//!
//! `report` and `stats` can then focus on presentation (HTML vs terminal).

use std::path::Path;

use crate::domain::ReportConfig;
use crate::error::AppError;
use crate::io::ingest::{ReadingTable, load_readings};
use crate::plot::{BarSeriesData, ChartData, ChartKind, ChartSpec, Figure, LineSeriesData, render};
use crate::stats::{AggregateResult, aggregate};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub daily: ReadingTable,
    pub hourly: Option<ReadingTable>,
    pub stations: Option<ReadingTable>,
    pub aggregates: AggregateResult,
}

/// Load every input table and compute the aggregates.
///
/// The daily table is required; the hourly and station tables are loaded only
/// when configured, and a configured-but-missing file is a warning, not an
/// error (the matching report sections are simply omitted).
pub fn run_aggregation(config: &ReportConfig) -> Result<RunOutput, AppError> {
    let daily = load_readings(&config.daily_csv, config.trim_quantile)?;
    let hourly = load_optional(config.hourly_csv.as_deref(), config.trim_quantile)?;
    let stations = load_optional(config.station_csv.as_deref(), config.trim_quantile)?;

    let aggregates = aggregate(
        &daily.readings,
        hourly.as_ref().map(|t| t.readings.as_slice()).unwrap_or(&[]),
        stations.as_ref().map(|t| t.readings.as_slice()).unwrap_or(&[]),
        config,
    );

    Ok(RunOutput {
        daily,
        hourly,
        stations,
        aggregates,
    })
}

fn load_optional(
    path: Option<&Path>,
    trim_quantile: Option<f64>,
) -> Result<Option<ReadingTable>, AppError> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        eprintln!("Warning: file not found, skipping: {}", path.display());
        return Ok(None);
    }
    load_readings(path, trim_quantile).map(Some)
}

/// Build the report's figures from the aggregates, in document order.
///
/// Sections without data are skipped entirely rather than rendered as empty
/// charts, mirroring how the original report dropped its station section.
pub fn build_figures(agg: &AggregateResult, config: &ReportConfig) -> Result<Vec<Figure>, AppError> {
    let mut specs = Vec::new();

    // 1) Yearly PM2.5 trend lines for the most polluted cities.
    let trend_series: Vec<LineSeriesData> = agg
        .trend_cities
        .iter()
        .map(|city| LineSeriesData {
            name: city.clone(),
            points: agg
                .trend
                .iter()
                .filter(|p| &p.city == city)
                .map(|p| (p.year as f64, p.mean_pm25))
                .collect(),
        })
        .collect();
    specs.push(ChartSpec {
        title: format!("PM2.5 Trends in Top {} Polluted Cities", agg.trend_cities.len()),
        kind: ChartKind::Line,
        data: ChartData::Lines {
            x_label: "Year".to_string(),
            y_label: "Average PM2.5 (µg/m³)".to_string(),
            series: trend_series,
        },
    });

    // 2) AQI category distribution, each bar in its CPCB color. The zero
    // counts of an empty run would still render as a chart, so gate on the
    // total instead of relying on the emptiness filter below.
    let categorized_rows: usize = agg.histogram.iter().map(|&(_, n)| n).sum();
    if categorized_rows > 0 {
        specs.push(ChartSpec {
            title: "Air Quality Distribution".to_string(),
            kind: ChartKind::Bar,
            data: ChartData::Bars {
                y_label: "Days".to_string(),
                categories: agg
                    .histogram
                    .iter()
                    .map(|(c, _)| c.display_name().to_string())
                    .collect(),
                series: vec![BarSeriesData {
                    name: "Days".to_string(),
                    values: agg.histogram.iter().map(|&(_, n)| Some(n as f64)).collect(),
                    colors: Some(agg.histogram.iter().map(|(c, _)| c.color()).collect()),
                }],
            },
        });
    }

    // 3) Overall pollutant composition, highest mean first.
    specs.push(ChartSpec {
        title: "Pollutant Composition Breakdown".to_string(),
        kind: ChartKind::Bar,
        data: ChartData::Bars {
            y_label: "Mean concentration (µg/m³)".to_string(),
            categories: agg
                .composition
                .iter()
                .map(|(p, _)| p.display_name().to_string())
                .collect(),
            series: vec![BarSeriesData {
                name: "Mean".to_string(),
                values: agg.composition.iter().map(|&(_, m)| Some(m)).collect(),
                colors: None,
            }],
        },
    });

    // 4) Seasonal means, highest first, season-colored.
    specs.push(ChartSpec {
        title: "Average PM2.5 by Season".to_string(),
        kind: ChartKind::Bar,
        data: ChartData::Bars {
            y_label: "PM2.5 (µg/m³)".to_string(),
            categories: agg
                .seasonal
                .iter()
                .map(|(s, _)| s.display_name().to_string())
                .collect(),
            series: vec![BarSeriesData {
                name: "PM2.5".to_string(),
                values: agg.seasonal.iter().map(|&(_, m)| Some(m)).collect(),
                colors: Some(agg.seasonal.iter().map(|(s, _)| s.color()).collect()),
            }],
        },
    });

    // 5) Hourly pattern for the focus city.
    specs.push(ChartSpec {
        title: format!("24-Hour PM2.5 Pattern in {}", config.focus_city),
        kind: ChartKind::Line,
        data: ChartData::Lines {
            x_label: "Hour of Day".to_string(),
            y_label: "PM2.5 (µg/m³)".to_string(),
            series: vec![LineSeriesData {
                name: config.focus_city.clone(),
                points: agg.hourly.iter().map(|&(h, m)| (h as f64, m)).collect(),
            }],
        },
    });

    // 6) Major pollutant comparison across the top cities.
    specs.push(ChartSpec {
        title: format!("Top {} Cities - Major Pollutant Comparison", agg.comparison.len()),
        kind: ChartKind::Bar,
        data: ChartData::Bars {
            y_label: "Concentration (µg/m³)".to_string(),
            categories: agg.comparison.iter().map(|r| r.city.clone()).collect(),
            series: vec![
                BarSeriesData {
                    name: "PM2.5".to_string(),
                    values: agg.comparison.iter().map(|r| r.pm25).collect(),
                    colors: None,
                },
                BarSeriesData {
                    name: "PM10".to_string(),
                    values: agg.comparison.iter().map(|r| r.pm10).collect(),
                    colors: None,
                },
                BarSeriesData {
                    name: "NO2".to_string(),
                    values: agg.comparison.iter().map(|r| r.no2).collect(),
                    colors: None,
                },
            ],
        },
    });

    // 7) Station-level means for the focus city.
    specs.push(ChartSpec {
        title: format!("Most Polluted Monitoring Stations in {}", config.focus_city),
        kind: ChartKind::Bar,
        data: ChartData::Bars {
            y_label: "Average PM2.5 (µg/m³)".to_string(),
            categories: agg.stations.iter().map(|(s, _)| s.clone()).collect(),
            series: vec![BarSeriesData {
                name: "PM2.5".to_string(),
                values: agg.stations.iter().map(|&(_, m)| Some(m)).collect(),
                colors: None,
            }],
        },
    });

    // 8) Pollutant correlation heatmap.
    specs.push(ChartSpec {
        title: "Pollutant Correlation Matrix".to_string(),
        kind: ChartKind::Heatmap,
        data: ChartData::Matrix {
            labels: agg.correlation.labels.clone(),
            values: agg.correlation.values.clone(),
        },
    });

    specs
        .iter()
        .filter(|spec| !spec.data.is_empty())
        .map(render)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pollutant, Reading};
    use chrono::NaiveDate;

    fn reading(city: &str, ymd: (i32, u32, u32), pm25: f64, pm10: Option<f64>) -> Reading {
        let mut values = [None; Pollutant::COUNT];
        values[Pollutant::Pm25.index()] = Some(pm25);
        values[Pollutant::Pm10.index()] = pm10;
        Reading {
            city: city.to_string(),
            station: None,
            datetime: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            values,
            aqi: None,
        }
    }

    fn config() -> ReportConfig {
        ReportConfig {
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
        }
    }

    #[test]
    fn empty_aggregates_produce_no_figures() {
        let agg = aggregate(&[], &[], &[], &config());
        let figures = build_figures(&agg, &config()).unwrap();
        assert!(figures.is_empty());
    }

    #[test]
    fn figures_follow_available_sections() {
        let daily = vec![
            reading("Delhi", (2019, 1, 1), 180.0, Some(220.0)),
            reading("Delhi", (2020, 1, 1), 160.0, Some(200.0)),
            reading("Mumbai", (2019, 6, 1), 60.0, Some(90.0)),
            reading("Mumbai", (2020, 6, 1), 55.0, Some(85.0)),
        ];
        let agg = aggregate(&daily, &[], &[], &config());
        let figures = build_figures(&agg, &config()).unwrap();

        let titles: Vec<&str> = figures.iter().map(|f| f.title.as_str()).collect();
        assert!(titles.iter().any(|t| t.contains("PM2.5 Trends")));
        assert!(titles.iter().any(|t| t.contains("Air Quality Distribution")));
        assert!(titles.iter().any(|t| t.contains("Pollutant Composition")));
        assert!(titles.iter().any(|t| t.contains("Season")));
        assert!(titles.iter().any(|t| t.contains("Correlation")));
        // No hourly or station inputs, so those sections are absent.
        assert!(!titles.iter().any(|t| t.contains("24-Hour")));
        assert!(!titles.iter().any(|t| t.contains("Stations")));
    }
}
