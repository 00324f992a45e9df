//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during aggregation
//! - exported to JSON/CSV
//! - reused by the HTML assembler without conversion

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Pollutant columns tracked per reading.
///
/// The order here fixes the column order in exports and the axis order of the
/// correlation heatmap, so it should stay stable. `Ord` follows declaration
/// order, same as `index()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    Nh3,
    So2,
    Co,
    O3,
    Benzene,
    Toluene,
    Xylene,
}

impl Pollutant {
    pub const ALL: [Pollutant; 10] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::Nh3,
        Pollutant::So2,
        Pollutant::Co,
        Pollutant::O3,
        Pollutant::Benzene,
        Pollutant::Toluene,
        Pollutant::Xylene,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Position in `ALL`, usable as an index into per-reading value arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical CSV column name (Kaggle "Air Quality Data in India" schema).
    pub fn column(self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::Nh3 => "NH3",
            Pollutant::So2 => "SO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
            Pollutant::Benzene => "Benzene",
            Pollutant::Toluene => "Toluene",
            Pollutant::Xylene => "Xylene",
        }
    }

    /// Accepted header spellings, lowercased (see `io::ingest::build_header_map`).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Pollutant::Pm25 => &["pm2.5", "pm2_5", "pm25"],
            Pollutant::Pm10 => &["pm10", "pm_10"],
            Pollutant::No2 => &["no2"],
            Pollutant::Nh3 => &["nh3"],
            Pollutant::So2 => &["so2"],
            Pollutant::Co => &["co"],
            Pollutant::O3 => &["o3"],
            Pollutant::Benzene => &["benzene"],
            Pollutant::Toluene => &["toluene"],
            Pollutant::Xylene => &["xylene"],
        }
    }

    pub fn display_name(self) -> &'static str {
        self.column()
    }
}

/// Indian meteorological season, derived from the calendar month.
///
/// `Ord` follows the calendar order of `ALL`, so seasons can key a `BTreeMap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Summer,
    Monsoon,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Summer, Season::Monsoon, Season::Autumn];

    /// Month → season mapping: Winter = Dec–Feb, Summer = Mar–May,
    /// Monsoon = Jun–Sep, Autumn = Oct–Nov.
    pub fn from_month(month: u32) -> Season {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Summer,
            6..=9 => Season::Monsoon,
            _ => Season::Autumn,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Summer => "Summer",
            Season::Monsoon => "Monsoon",
            Season::Autumn => "Autumn",
        }
    }

    /// Chart color for this season.
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            Season::Winter => (0x34, 0x98, 0xDB),
            Season::Summer => (0xF3, 0x9C, 0x12),
            Season::Monsoon => (0x2E, 0xCC, 0x71),
            Season::Autumn => (0xE7, 0x4C, 0x3C),
        }
    }
}

/// CPCB-style air quality band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

impl AqiCategory {
    pub const ALL: [AqiCategory; 6] = [
        AqiCategory::Good,
        AqiCategory::Satisfactory,
        AqiCategory::Moderate,
        AqiCategory::Poor,
        AqiCategory::VeryPoor,
        AqiCategory::Severe,
    ];

    /// Bucket a reported AQI value on the CPCB band edges.
    pub fn from_aqi(aqi: f64) -> AqiCategory {
        if aqi <= 50.0 {
            AqiCategory::Good
        } else if aqi <= 100.0 {
            AqiCategory::Satisfactory
        } else if aqi <= 200.0 {
            AqiCategory::Moderate
        } else if aqi <= 300.0 {
            AqiCategory::Poor
        } else if aqi <= 400.0 {
            AqiCategory::VeryPoor
        } else {
            AqiCategory::Severe
        }
    }

    /// Bucket a raw PM2.5 concentration (µg/m³) when no AQI value is reported.
    pub fn from_pm25(pm25: f64) -> AqiCategory {
        if pm25 <= 30.0 {
            AqiCategory::Good
        } else if pm25 <= 60.0 {
            AqiCategory::Satisfactory
        } else if pm25 <= 90.0 {
            AqiCategory::Moderate
        } else if pm25 <= 120.0 {
            AqiCategory::Poor
        } else if pm25 <= 250.0 {
            AqiCategory::VeryPoor
        } else {
            AqiCategory::Severe
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Satisfactory => "Satisfactory",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::Poor => "Poor",
            AqiCategory::VeryPoor => "Very Poor",
            AqiCategory::Severe => "Severe",
        }
    }

    /// CPCB display color for this band (used in charts and the report legend).
    pub fn color(self) -> (u8, u8, u8) {
        match self {
            AqiCategory::Good => (0x00, 0xE4, 0x00),
            AqiCategory::Satisfactory => (0xCC, 0xCC, 0x00),
            AqiCategory::Moderate => (0xFF, 0x7E, 0x00),
            AqiCategory::Poor => (0xFF, 0x00, 0x00),
            AqiCategory::VeryPoor => (0x8F, 0x3F, 0x97),
            AqiCategory::Severe => (0x7E, 0x00, 0x23),
        }
    }

    /// AQI range label for the report legend.
    pub fn range_label(self) -> &'static str {
        match self {
            AqiCategory::Good => "0-50",
            AqiCategory::Satisfactory => "51-100",
            AqiCategory::Moderate => "101-200",
            AqiCategory::Poor => "201-300",
            AqiCategory::VeryPoor => "301-400",
            AqiCategory::Severe => "401+",
        }
    }

    pub fn health_note(self) -> &'static str {
        match self {
            AqiCategory::Good => "Air quality is satisfactory, minimal health impact",
            AqiCategory::Satisfactory => {
                "Acceptable air quality, sensitive people may experience minor issues"
            }
            AqiCategory::Moderate => "May cause breathing discomfort to sensitive groups",
            AqiCategory::Poor => "Breathing discomfort to most people on prolonged exposure",
            AqiCategory::VeryPoor => "Respiratory illness on prolonged exposure",
            AqiCategory::Severe => {
                "Affects healthy people and seriously impacts those with existing diseases"
            }
        }
    }
}

/// One measurement row: a city (optionally a station) at a point in time.
///
/// Pollutant values are per-column optional; a missing value excludes the row
/// from that pollutant's aggregates and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub city: String,
    pub station: Option<String>,
    pub datetime: NaiveDateTime,
    pub values: [Option<f64>; Pollutant::COUNT],
    /// Reported composite AQI, when the dataset provides one.
    pub aqi: Option<f64>,
}

impl Reading {
    pub fn value(&self, p: Pollutant) -> Option<f64> {
        self.values[p.index()]
    }

    pub fn pm25(&self) -> Option<f64> {
        self.value(Pollutant::Pm25)
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    pub fn year(&self) -> i32 {
        self.datetime.year()
    }

    pub fn hour(&self) -> u32 {
        self.datetime.hour()
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.datetime.month())
    }

    /// Air quality band for this row: reported AQI wins, PM2.5 is the fallback.
    ///
    /// Returns `None` when neither value is present; such rows are excluded
    /// from the category histogram.
    pub fn category(&self) -> Option<AqiCategory> {
        if let Some(aqi) = self.aqi {
            return Some(AqiCategory::from_aqi(aqi));
        }
        self.pm25().map(AqiCategory::from_pm25)
    }
}

/// Everything a single report run needs, resolved from CLI args + environment.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub daily_csv: PathBuf,
    pub hourly_csv: Option<PathBuf>,
    pub station_csv: Option<PathBuf>,
    pub out_path: PathBuf,
    pub title: String,
    /// City used for the hourly-pattern and station charts.
    pub focus_city: String,
    /// How many cities to draw on the yearly-trend chart.
    pub top_trend: usize,
    /// How many cities to include in the comparison chart.
    pub top_compare: usize,
    /// Per-pollutant upper-quantile trim; `None` disables outlier trimming.
    pub trim_quantile: Option<f64>,
    pub export_tables: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_mapping_matches_calendar() {
        assert_eq!(Season::from_month(12), Season::Winter);
        assert_eq!(Season::from_month(1), Season::Winter);
        assert_eq!(Season::from_month(4), Season::Summer);
        assert_eq!(Season::from_month(7), Season::Monsoon);
        assert_eq!(Season::from_month(9), Season::Monsoon);
        assert_eq!(Season::from_month(10), Season::Autumn);
        assert_eq!(Season::from_month(11), Season::Autumn);
    }

    #[test]
    fn pm25_thresholds_bucket_edges() {
        assert_eq!(AqiCategory::from_pm25(30.0), AqiCategory::Good);
        assert_eq!(AqiCategory::from_pm25(50.0), AqiCategory::Satisfactory);
        assert_eq!(AqiCategory::from_pm25(90.0), AqiCategory::Moderate);
        assert_eq!(AqiCategory::from_pm25(120.0), AqiCategory::Poor);
        assert_eq!(AqiCategory::from_pm25(150.0), AqiCategory::VeryPoor);
        assert_eq!(AqiCategory::from_pm25(250.1), AqiCategory::Severe);
    }

    #[test]
    fn reported_aqi_takes_precedence_over_pm25() {
        let mut values = [None; Pollutant::COUNT];
        values[Pollutant::Pm25.index()] = Some(300.0);
        let reading = Reading {
            city: "Delhi".to_string(),
            station: None,
            datetime: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            values,
            aqi: Some(40.0),
        };
        assert_eq!(reading.category(), Some(AqiCategory::Good));
    }

    #[test]
    fn category_absent_without_aqi_or_pm25() {
        let reading = Reading {
            city: "Delhi".to_string(),
            station: None,
            datetime: NaiveDate::from_ymd_opt(2020, 6, 1).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            values: [None; Pollutant::COUNT],
            aqi: None,
        };
        assert_eq!(reading.category(), None);
    }
}
