//! Aggregation: turn a table of readings into the derived tables the report
//! is built from.
//!
//! Responsibilities:
//!
//! - yearly trend series for the most polluted cities
//! - seasonal / hourly mean patterns
//! - per-city pollutant comparison
//! - AQI category histogram
//! - overall pollutant composition
//! - pairwise pollutant correlation
//!
//! Every operation excludes missing values per column and never fails on an
//! empty table; an empty input produces empty aggregates.

pub mod correlate;
pub mod groupby;

pub use correlate::*;
pub use groupby::*;

use serde::Serialize;

use chrono::NaiveDate;

use crate::domain::{AqiCategory, Pollutant, Reading, ReportConfig, Season};

/// Stations shown in the focus-city station chart.
const TOP_STATIONS: usize = 12;

/// One point of the yearly trend series.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub city: String,
    pub year: i32,
    pub mean_pm25: f64,
}

/// Per-city means for the comparison chart.
#[derive(Debug, Clone)]
pub struct CityMeans {
    pub city: String,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
}

/// Headline numbers for the stat cards at the top of the report.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineStats {
    pub mean_pm25: Option<f64>,
    pub peak_pm25: Option<f64>,
    pub city_count: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

/// All derived tables for one run. Immutable once computed; the renderer and
/// report assembler only read from it.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    /// Top trend cities, most polluted first. Fixes the series order of the
    /// trend chart.
    pub trend_cities: Vec<String>,
    /// Yearly mean PM2.5 per (city, year), restricted to `trend_cities`,
    /// sorted by city then year.
    pub trend: Vec<TrendPoint>,
    /// Seasonal mean PM2.5, highest first.
    pub seasonal: Vec<(Season, f64)>,
    /// Hourly mean PM2.5 for the focus city, hour ascending.
    pub hourly: Vec<(u32, f64)>,
    /// Per-city means of the major pollutants, top cities by PM2.5 first.
    pub comparison: Vec<CityMeans>,
    /// AQI category counts in band order, zero counts included.
    pub histogram: Vec<(AqiCategory, usize)>,
    /// Overall mean per pollutant column, highest first; columns with no
    /// observed values are dropped.
    pub composition: Vec<(Pollutant, f64)>,
    /// Pairwise pollutant correlation over the daily table.
    pub correlation: CorrelationMatrix,
    /// Mean PM2.5 per monitoring station in the focus city, highest first.
    pub stations: Vec<(String, f64)>,
    pub headline: HeadlineStats,
}

/// Compute every aggregate in one pass over the input tables.
///
/// `hourly` and `stations` may be empty; the corresponding tables come back
/// empty and the report simply omits those sections.
pub fn aggregate(
    daily: &[Reading],
    hourly: &[Reading],
    stations: &[Reading],
    config: &ReportConfig,
) -> AggregateResult {
    let trend_cities = top_cities_by_pm25(daily, config.top_trend);
    let trend = yearly_trend(daily, &trend_cities);
    let seasonal = seasonal_means(daily);
    let hourly = hourly_means(hourly, &config.focus_city);
    let comparison = city_comparison(daily, config.top_compare);
    let histogram = aqi_histogram(daily);
    let composition = pollutant_composition(daily);
    let correlation = pollutant_correlation(daily);
    let stations = station_means(stations, &config.focus_city);
    let headline = headline_stats(daily);

    AggregateResult {
        trend_cities,
        trend,
        seasonal,
        hourly,
        comparison,
        histogram,
        composition,
        correlation,
        stations,
        headline,
    }
}

/// Cities ranked by overall mean PM2.5, descending, name as tie-break.
pub fn top_cities_by_pm25(daily: &[Reading], top_n: usize) -> Vec<String> {
    let mut means = mean_by_key(daily.iter().map(|r| (r.city.clone(), r.pm25())));
    means.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    means.into_iter().take(top_n).map(|(city, _)| city).collect()
}

/// Mean PM2.5 per (city, year) for the given cities, sorted by city then year.
pub fn yearly_trend(daily: &[Reading], cities: &[String]) -> Vec<TrendPoint> {
    let items = daily
        .iter()
        .filter(|r| cities.contains(&r.city))
        .map(|r| ((r.city.clone(), r.year()), r.pm25()));
    mean_by_key(items)
        .into_iter()
        .map(|((city, year), mean_pm25)| TrendPoint { city, year, mean_pm25 })
        .collect()
}

/// Mean PM2.5 per season, highest first.
pub fn seasonal_means(daily: &[Reading]) -> Vec<(Season, f64)> {
    let mut means = mean_by_key(daily.iter().map(|r| (r.season(), r.pm25())));
    means.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    means
}

/// Mean PM2.5 per hour-of-day for one city, hour ascending.
pub fn hourly_means(hourly: &[Reading], city: &str) -> Vec<(u32, f64)> {
    let items = hourly
        .iter()
        .filter(|r| r.city == city)
        .map(|r| (r.hour(), r.pm25()));
    mean_by_key(items)
}

/// Per-city means of PM2.5 / PM10 / NO2 for the top cities by PM2.5.
pub fn city_comparison(daily: &[Reading], top_n: usize) -> Vec<CityMeans> {
    let pm25 = mean_by_key(daily.iter().map(|r| (r.city.clone(), r.pm25())));
    let pm10 = mean_by_key(daily.iter().map(|r| (r.city.clone(), r.value(Pollutant::Pm10))));
    let no2 = mean_by_key(daily.iter().map(|r| (r.city.clone(), r.value(Pollutant::No2))));

    let lookup = |table: &[(String, f64)], city: &str| -> Option<f64> {
        table
            .binary_search_by(|(c, _)| c.as_str().cmp(city))
            .ok()
            .map(|i| table[i].1)
    };

    top_cities_by_pm25(daily, top_n)
        .into_iter()
        .map(|city| CityMeans {
            pm25: lookup(&pm25, &city),
            pm10: lookup(&pm10, &city),
            no2: lookup(&no2, &city),
            city,
        })
        .collect()
}

/// AQI category counts over the daily table, all six bands, zeros included.
///
/// The counts sum to the number of rows with a resolvable category (reported
/// AQI or PM2.5 present).
pub fn aqi_histogram(daily: &[Reading]) -> Vec<(AqiCategory, usize)> {
    let mut counts = [0usize; AqiCategory::ALL.len()];
    for r in daily {
        if let Some(cat) = r.category() {
            counts[cat as usize] += 1;
        }
    }
    AqiCategory::ALL
        .into_iter()
        .map(|cat| (cat, counts[cat as usize]))
        .collect()
}

/// Overall mean per pollutant column, highest first, column order as
/// tie-break. Columns with no observed values are dropped.
pub fn pollutant_composition(daily: &[Reading]) -> Vec<(Pollutant, f64)> {
    let items = daily
        .iter()
        .flat_map(|r| Pollutant::ALL.into_iter().map(move |p| (p, r.value(p))));
    let mut means = mean_by_key(items);
    means.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.index().cmp(&b.0.index()))
    });
    means
}

/// Correlation matrix over the pollutant columns with at least two observed
/// values in the daily table.
pub fn pollutant_correlation(daily: &[Reading]) -> CorrelationMatrix {
    let mut labels = Vec::new();
    let mut columns = Vec::new();
    for p in Pollutant::ALL {
        let column: Vec<Option<f64>> = daily.iter().map(|r| r.value(p)).collect();
        if column.iter().filter(|v| v.is_some()).count() >= 2 {
            labels.push(p.display_name().to_string());
            columns.push(column);
        }
    }
    correlation_matrix(labels, &columns)
}

/// Mean PM2.5 per station for one city, highest first, capped at
/// `TOP_STATIONS`.
pub fn station_means(stations: &[Reading], city: &str) -> Vec<(String, f64)> {
    let items = stations
        .iter()
        .filter(|r| r.city == city)
        .filter_map(|r| r.station.clone().map(|s| (s, r.pm25())));
    let mut means = mean_by_key(items);
    means.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    means.truncate(TOP_STATIONS);
    means
}

/// Headline stats for the report header.
pub fn headline_stats(daily: &[Reading]) -> HeadlineStats {
    let mut acc = MeanAcc::default();
    let mut peak: Option<f64> = None;
    for v in daily.iter().filter_map(|r| r.pm25()) {
        acc.push(v);
        peak = Some(peak.map_or(v, |p: f64| p.max(v)));
    }

    let mut cities: Vec<&str> = daily.iter().map(|r| r.city.as_str()).collect();
    cities.sort_unstable();
    cities.dedup();

    HeadlineStats {
        mean_pm25: acc.mean(),
        peak_pm25: peak,
        city_count: cities.len(),
        date_min: daily.iter().map(|r| r.date()).min(),
        date_max: daily.iter().map(|r| r.date()).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn reading(city: &str, date: (i32, u32, u32), pm25: Option<f64>) -> Reading {
        let mut values = [None; Pollutant::COUNT];
        values[Pollutant::Pm25.index()] = pm25;
        Reading {
            city: city.to_string(),
            station: None,
            datetime: NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            values,
            aqi: None,
        }
    }

    fn config() -> ReportConfig {
        ReportConfig {
            daily_csv: PathBuf::from("city_day.csv"),
            hourly_csv: None,
            station_csv: None,
            out_path: PathBuf::from("dashboard.html"),
            title: "test".to_string(),
            focus_city: "Delhi".to_string(),
            top_trend: 8,
            top_compare: 12,
            trim_quantile: None,
            export_tables: None,
            export_summary: None,
        }
    }

    #[test]
    fn empty_input_yields_empty_aggregates() {
        let agg = aggregate(&[], &[], &[], &config());
        assert!(agg.trend.is_empty());
        assert!(agg.trend_cities.is_empty());
        assert!(agg.seasonal.is_empty());
        assert!(agg.hourly.is_empty());
        assert!(agg.comparison.is_empty());
        assert!(agg.composition.is_empty());
        assert!(agg.correlation.is_empty());
        assert!(agg.stations.is_empty());
        assert_eq!(agg.histogram.iter().map(|(_, n)| n).sum::<usize>(), 0);
        assert_eq!(agg.headline.city_count, 0);
        assert_eq!(agg.headline.mean_pm25, None);
    }

    #[test]
    fn histogram_counts_sum_to_categorizable_rows() {
        let daily = vec![
            reading("Delhi", (2020, 1, 1), Some(50.0)),
            reading("Mumbai", (2020, 1, 1), Some(150.0)),
            reading("Chennai", (2020, 1, 1), None), // no AQI, no PM2.5
        ];
        let hist = aqi_histogram(&daily);
        let total: usize = hist.iter().map(|(_, n)| n).sum();
        assert_eq!(total, 2);

        let count_of = |cat: AqiCategory| hist.iter().find(|(c, _)| *c == cat).unwrap().1;
        assert_eq!(count_of(AqiCategory::Satisfactory), 1);
        assert_eq!(count_of(AqiCategory::VeryPoor), 1);
        assert_eq!(count_of(AqiCategory::Good), 0);
    }

    #[test]
    fn missing_pm10_excluded_from_pm10_aggregates_only() {
        let mut r1 = reading("Delhi", (2020, 1, 1), Some(100.0));
        r1.values[Pollutant::Pm10.index()] = Some(200.0);
        let r2 = reading("Delhi", (2020, 1, 2), Some(50.0)); // PM10 missing

        let comparison = city_comparison(&[r1, r2], 5);
        assert_eq!(comparison.len(), 1);
        let delhi = &comparison[0];
        // PM2.5 mean uses both rows; PM10 mean only the first.
        assert!((delhi.pm25.unwrap() - 75.0).abs() < 1e-12);
        assert!((delhi.pm10.unwrap() - 200.0).abs() < 1e-12);
        assert_eq!(delhi.no2, None);
    }

    #[test]
    fn composition_means_exclude_missing_per_column() {
        let mut r1 = reading("Delhi", (2020, 1, 1), Some(100.0));
        r1.values[Pollutant::Pm10.index()] = Some(200.0);
        let r2 = reading("Delhi", (2020, 1, 2), Some(50.0)); // PM10 missing

        let composition = pollutant_composition(&[r1, r2]);
        // PM10 averages over its one observed value, PM2.5 over both rows;
        // unobserved columns do not appear at all.
        assert_eq!(composition, vec![(Pollutant::Pm10, 200.0), (Pollutant::Pm25, 75.0)]);
    }

    #[test]
    fn trend_restricted_to_top_cities_and_sorted() {
        let daily = vec![
            reading("Alpha", (2019, 2, 1), Some(10.0)),
            reading("Beta", (2019, 2, 1), Some(90.0)),
            reading("Beta", (2020, 2, 1), Some(110.0)),
            reading("Gamma", (2019, 2, 1), Some(50.0)),
        ];
        let cities = top_cities_by_pm25(&daily, 2);
        assert_eq!(cities, vec!["Beta".to_string(), "Gamma".to_string()]);

        let trend = yearly_trend(&daily, &cities);
        assert_eq!(
            trend,
            vec![
                TrendPoint { city: "Beta".to_string(), year: 2019, mean_pm25: 90.0 },
                TrendPoint { city: "Beta".to_string(), year: 2020, mean_pm25: 110.0 },
                TrendPoint { city: "Gamma".to_string(), year: 2019, mean_pm25: 50.0 },
            ]
        );
    }

    #[test]
    fn seasonal_means_sorted_descending() {
        let daily = vec![
            reading("Delhi", (2020, 1, 15), Some(200.0)), // Winter
            reading("Delhi", (2020, 4, 15), Some(80.0)),  // Summer
            reading("Delhi", (2020, 7, 15), Some(40.0)),  // Monsoon
        ];
        let seasonal = seasonal_means(&daily);
        assert_eq!(seasonal[0].0, Season::Winter);
        assert_eq!(seasonal[1].0, Season::Summer);
        assert_eq!(seasonal[2].0, Season::Monsoon);
    }

    #[test]
    fn hourly_means_filter_focus_city() {
        let mut delhi_8 = reading("Delhi", (2020, 1, 1), Some(60.0));
        delhi_8.datetime = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mumbai_8 = {
            let mut r = reading("Mumbai", (2020, 1, 1), Some(500.0));
            r.datetime = delhi_8.datetime;
            r
        };
        let hourly = hourly_means(&[delhi_8, mumbai_8], "Delhi");
        assert_eq!(hourly, vec![(8, 60.0)]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let daily = vec![
            reading("Delhi", (2020, 1, 1), Some(90.0)),
            reading("Mumbai", (2020, 1, 1), Some(70.0)),
            reading("Chennai", (2020, 5, 1), Some(30.0)),
        ];
        let a = aggregate(&daily, &[], &[], &config());
        let b = aggregate(&daily, &[], &[], &config());
        assert_eq!(a.trend, b.trend);
        assert_eq!(a.trend_cities, b.trend_cities);
        assert_eq!(a.histogram, b.histogram);
        assert_eq!(a.seasonal, b.seasonal);
    }
}
