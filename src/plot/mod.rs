//! Chart rendering.
//!
//! Why Plotters with the SVG backend?
//! - vector output embeds directly into the HTML report (no base64, no raster)
//! - no native font/system dependencies with default features disabled
//! - same chart API whether we later add PNG export or not
//!
//! Charts are intentionally data-driven: a `ChartSpec` carries everything the
//! renderer needs, so rendering is a pure function of its input and the data
//! prep stays testable on its own.

pub mod svg;

pub use svg::*;

use crate::error::AppError;

/// Chart type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Heatmap,
}

/// A rendered chart: title + inline SVG. Its only identity is its position
/// in the report.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub svg: String,
}

/// One line series (x, y) with a legend name.
#[derive(Debug, Clone)]
pub struct LineSeriesData {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// One bar series: a value per category, optionally with per-bar colors
/// (used for the AQI band chart where each bar has its CPCB color).
#[derive(Debug, Clone)]
pub struct BarSeriesData {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub colors: Option<Vec<(u8, u8, u8)>>,
}

/// Chart payload. The variant must match the spec's `ChartKind`.
#[derive(Debug, Clone)]
pub enum ChartData {
    Lines {
        x_label: String,
        y_label: String,
        series: Vec<LineSeriesData>,
    },
    Bars {
        y_label: String,
        categories: Vec<String>,
        series: Vec<BarSeriesData>,
    },
    Matrix {
        labels: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    },
}

impl ChartData {
    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::Lines { series, .. } => series.iter().all(|s| s.points.is_empty()),
            ChartData::Bars { categories, series, .. } => {
                categories.is_empty()
                    || series.iter().all(|s| s.values.iter().all(|v| v.is_none()))
            }
            ChartData::Matrix { values, .. } => {
                values.iter().all(|row| row.iter().all(|v| v.is_none()))
            }
        }
    }
}

/// Everything needed to render one figure.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub data: ChartData,
}

/// Render a chart spec to a figure. Pure function of its input.
pub fn render(spec: &ChartSpec) -> Result<Figure, AppError> {
    match (spec.kind, &spec.data) {
        (ChartKind::Line, ChartData::Lines { x_label, y_label, series }) => {
            svg::render_lines(&spec.title, x_label, y_label, series)
        }
        (ChartKind::Bar, ChartData::Bars { y_label, categories, series }) => {
            svg::render_bars(&spec.title, y_label, categories, series)
        }
        (ChartKind::Heatmap, ChartData::Matrix { labels, values }) => {
            svg::render_heatmap(&spec.title, labels, values)
        }
        (kind, _) => Err(AppError::render(format!(
            "Chart data does not match chart kind {kind:?}."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_rejects_mismatched_kind_and_data() {
        let spec = ChartSpec {
            title: "t".to_string(),
            kind: ChartKind::Heatmap,
            data: ChartData::Lines {
                x_label: "x".to_string(),
                y_label: "y".to_string(),
                series: vec![],
            },
        };
        let err = render(&spec).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn render_is_deterministic() {
        let spec = ChartSpec {
            title: "Trend".to_string(),
            kind: ChartKind::Line,
            data: ChartData::Lines {
                x_label: "Year".to_string(),
                y_label: "PM2.5".to_string(),
                series: vec![LineSeriesData {
                    name: "Delhi".to_string(),
                    points: vec![(2015.0, 120.0), (2016.0, 110.0), (2017.0, 130.0)],
                }],
            },
        };
        let a = render(&spec).unwrap();
        let b = render(&spec).unwrap();
        assert_eq!(a.svg, b.svg);
        assert!(a.svg.starts_with("<svg"));
    }

    #[test]
    fn empty_detection() {
        let data = ChartData::Bars {
            y_label: "y".to_string(),
            categories: vec!["a".to_string()],
            series: vec![BarSeriesData {
                name: "s".to_string(),
                values: vec![None],
                colors: None,
            }],
        };
        assert!(data.is_empty());
    }
}
