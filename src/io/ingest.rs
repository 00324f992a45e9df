//! CSV ingest and normalization.
//!
//! This module turns the raw air-quality CSVs into clean `Reading` rows that
//! are safe to aggregate.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{Pollutant, Reading};
use crate::error::AppError;
use crate::stats::quantile;

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub city: Option<String>,
    pub message: String,
}

/// Summary stats about the rows actually kept.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_cities: usize,
    pub date_min: Option<NaiveDate>,
    pub date_max: Option<NaiveDate>,
}

/// Ingest output: normalized readings + stats + row errors.
#[derive(Debug, Clone)]
pub struct ReadingTable {
    pub readings: Vec<Reading>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub stats: DatasetStats,
}

impl ReadingTable {
    pub fn rows_used(&self) -> usize {
        self.readings.len()
    }

    pub fn empty() -> Self {
        Self {
            readings: Vec::new(),
            row_errors: Vec::new(),
            rows_read: 0,
            stats: DatasetStats {
                n_rows: 0,
                n_cities: 0,
                date_min: None,
                date_max: None,
            },
        }
    }
}

/// Resolved column indices for one file.
#[derive(Debug, Clone)]
struct ColumnMap {
    city: usize,
    datetime: usize,
    station: Option<usize>,
    aqi: Option<usize>,
    pollutants: [Option<usize>; Pollutant::COUNT],
}

/// Load and normalize a CSV of readings.
///
/// `trim_quantile`, when set, drops each pollutant value above that quantile
/// of its own column (the value becomes missing; the row survives for the
/// other columns).
pub fn load_readings(path: &Path, trim_quantile: Option<f64>) -> Result<ReadingTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::data_format(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_table(file, trim_quantile)
        .map_err(|e| AppError::data_format(format!("{}: {e}", path.display())))
}

/// Reader-based entry point so tests can feed in-memory CSV text.
pub fn read_table(input: impl Read, trim_quantile: Option<f64>) -> Result<ReadingTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::data_format(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns = resolve_columns(&header_map)?;

    let mut readings = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    city: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &columns) {
            Ok(reading) => readings.push(reading),
            Err((city, message)) => row_errors.push(RowError { line, city, message }),
        }
    }

    if let Some(q) = trim_quantile {
        trim_outliers(&mut readings, q);
    }

    let stats = dataset_stats(&readings);
    Ok(ReadingTable {
        readings,
        row_errors,
        rows_read,
        stats,
    })
}

/// Lowercased header name → column index. First occurrence wins.
fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        map.entry(name.trim().to_lowercase()).or_insert(idx);
    }
    map
}

fn find_column(map: &HashMap<String, usize>, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|name| map.get(*name).copied())
}

fn resolve_columns(map: &HashMap<String, usize>) -> Result<ColumnMap, AppError> {
    let city = find_column(map, &["city"])
        .ok_or_else(|| AppError::data_format("Missing required column 'City'."))?;
    let datetime = find_column(map, &["datetime", "date"])
        .ok_or_else(|| AppError::data_format("Missing required column 'Datetime' (or 'Date')."))?;

    let mut pollutants = [None; Pollutant::COUNT];
    for p in Pollutant::ALL {
        pollutants[p.index()] = find_column(map, p.aliases());
    }

    Ok(ColumnMap {
        city,
        datetime,
        station: find_column(map, &["station", "stationid", "station_id"]),
        aqi: find_column(map, &["aqi"]),
        pollutants,
    })
}

fn field<'a>(record: &'a StringRecord, idx: usize) -> &'a str {
    record.get(idx).unwrap_or("")
}

fn parse_row(
    record: &StringRecord,
    columns: &ColumnMap,
) -> Result<Reading, (Option<String>, String)> {
    let city_raw = field(record, columns.city);
    if city_raw.is_empty() {
        return Err((None, "Empty city name.".to_string()));
    }
    let city = title_case(city_raw);

    let datetime_raw = field(record, columns.datetime);
    let datetime = parse_datetime(datetime_raw).ok_or_else(|| {
        (
            Some(city.clone()),
            format!("Unparsable timestamp '{datetime_raw}'."),
        )
    })?;

    let mut values = [None; Pollutant::COUNT];
    for p in Pollutant::ALL {
        if let Some(idx) = columns.pollutants[p.index()] {
            values[p.index()] = parse_value(field(record, idx))
                .map_err(|e| (Some(city.clone()), format!("{}: {e}", p.column())))?;
        }
    }

    let aqi = match columns.aqi {
        Some(idx) => {
            parse_value(field(record, idx)).map_err(|e| (Some(city.clone()), format!("AQI: {e}")))?
        }
        None => None,
    };

    let station = columns
        .station
        .map(|idx| field(record, idx))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(Reading {
        city,
        station,
        datetime,
        values,
        aqi,
    })
}

/// Accepted timestamp shapes, tried in order. Date-only rows get hour 0.
fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Empty / NA cells are missing values; anything else must parse as a number.
fn parse_value(s: &str) -> Result<Option<f64>, String> {
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let v: f64 = s
        .parse()
        .map_err(|_| format!("Unparsable numeric value '{s}'."))?;
    if !v.is_finite() {
        return Ok(None);
    }
    Ok(Some(v))
}

/// Trim + title-case city names so "delhi " and "DELHI" group together.
///
/// Also used on the CLI's `--focus-city` so it matches normalized rows.
pub fn normalize_city(s: &str) -> String {
    title_case(s)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, word) in s.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(|c| c.to_lowercase()));
        }
    }
    out
}

/// Drop each pollutant value strictly above the `q` quantile of its column.
///
/// The cut is per column (the value becomes missing, the row survives) so it
/// composes with per-column missing-value exclusion. Strictly-above keeps
/// constant columns intact.
fn trim_outliers(readings: &mut [Reading], q: f64) {
    for p in Pollutant::ALL {
        let observed: Vec<f64> = readings.iter().filter_map(|r| r.value(p)).collect();
        let Some(threshold) = quantile(&observed, q) else {
            continue;
        };
        for r in readings.iter_mut() {
            if r.values[p.index()].is_some_and(|v| v > threshold) {
                r.values[p.index()] = None;
            }
        }
    }
}

fn dataset_stats(readings: &[Reading]) -> DatasetStats {
    let mut cities: Vec<&str> = readings.iter().map(|r| r.city.as_str()).collect();
    cities.sort_unstable();
    cities.dedup();

    DatasetStats {
        n_rows: readings.len(),
        n_cities: cities.len(),
        date_min: readings.iter().map(|r| r.date()).min(),
        date_max: readings.iter().map(|r| r.date()).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Pollutant;

    fn load(csv_text: &str) -> ReadingTable {
        read_table(csv_text.as_bytes(), None).unwrap()
    }

    #[test]
    fn loads_daily_rows_with_missing_values() {
        let table = load(
            "City,Datetime,PM2.5,PM10,NO2,AQI\n\
             Delhi,2020-01-01,120.5,,40.0,310\n\
             mumbai,2020-01-02,55.0,88.0,NA,\n",
        );
        assert_eq!(table.rows_read, 2);
        assert_eq!(table.rows_used(), 2);
        assert!(table.row_errors.is_empty());

        let delhi = &table.readings[0];
        assert_eq!(delhi.city, "Delhi");
        assert_eq!(delhi.value(Pollutant::Pm25), Some(120.5));
        assert_eq!(delhi.value(Pollutant::Pm10), None);
        assert_eq!(delhi.aqi, Some(310.0));

        // City names are normalized to title case.
        assert_eq!(table.readings[1].city, "Mumbai");
        assert_eq!(table.readings[1].value(Pollutant::No2), None);
        assert_eq!(table.readings[1].aqi, None);
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let err = read_table("City,PM2.5\nDelhi,50\n".as_bytes(), None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_table_is_not_an_error() {
        let table = load("City,Datetime,PM2.5\n");
        assert_eq!(table.rows_used(), 0);
        assert_eq!(table.stats.n_cities, 0);
        assert_eq!(table.stats.date_min, None);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let table = load(
            "City,Datetime,PM2.5\n\
             Delhi,not-a-date,50\n\
             Delhi,2020-01-01,oops\n\
             Delhi,2020-01-02,60\n",
        );
        assert_eq!(table.rows_read, 3);
        assert_eq!(table.rows_used(), 1);
        assert_eq!(table.row_errors.len(), 2);
        assert_eq!(table.row_errors[0].line, 2);
        assert!(table.row_errors[0].message.contains("timestamp"));
        assert_eq!(table.row_errors[1].line, 3);
    }

    #[test]
    fn hourly_timestamps_keep_the_hour() {
        let table = load("City,Datetime,PM2.5\nDelhi,2020-01-01 17:00:00,50\n");
        assert_eq!(table.readings[0].hour(), 17);
    }

    #[test]
    fn station_column_is_picked_up() {
        let table = load(
            "City,Datetime,StationId,PM2.5\n\
             Delhi,2020-01-01,DL001,90\n",
        );
        assert_eq!(table.readings[0].station.as_deref(), Some("DL001"));
    }

    #[test]
    fn quantile_trim_nulls_only_the_offending_column() {
        let mut csv_text = String::from("City,Datetime,PM2.5,PM10\n");
        for day in 1..=20 {
            csv_text.push_str(&format!("Delhi,2020-01-{day:02},{},30\n", day as f64));
        }
        // Extreme PM2.5 outlier with a normal PM10 value.
        csv_text.push_str("Delhi,2020-02-01,10000,30\n");

        let table = read_table(csv_text.as_bytes(), Some(0.95)).unwrap();
        let outlier = table.readings.last().unwrap();
        assert_eq!(outlier.value(Pollutant::Pm25), None);
        assert_eq!(outlier.value(Pollutant::Pm10), Some(30.0));
        // The row itself survives.
        assert_eq!(table.rows_used(), 21);
    }

    #[test]
    fn header_aliases_resolve() {
        let table = load("city,date,pm2_5\nDelhi,2020-01-01,42\n");
        assert_eq!(table.readings[0].value(Pollutant::Pm25), Some(42.0));
    }
}
