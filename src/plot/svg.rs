//! Plotters SVG rendering for the three chart kinds.
//!
//! All functions render into an in-memory string; nothing here touches the
//! filesystem. Empty inputs produce a labelled placeholder figure rather than
//! an error so the report stays valid on thin data.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::AppError;
use crate::plot::{BarSeriesData, Figure, LineSeriesData};

const CHART_SIZE: (u32, u32) = (960, 520);

/// Series palette (shared with the report's accent colors).
const PALETTE: [(u8, u8, u8); 8] = [
    (0xE7, 0x4C, 0x3C),
    (0x34, 0x98, 0xDB),
    (0x2E, 0xCC, 0x71),
    (0xF3, 0x9C, 0x12),
    (0x9B, 0x59, 0xB6),
    (0x1A, 0xBC, 0x9C),
    (0x34, 0x49, 0x5E),
    (0xE6, 0x7E, 0x22),
];

fn palette_color(i: usize) -> RGBColor {
    let (r, g, b) = PALETTE[i % PALETTE.len()];
    RGBColor(r, g, b)
}

fn rgb((r, g, b): (u8, u8, u8)) -> RGBColor {
    RGBColor(r, g, b)
}

fn draw_err(e: impl std::fmt::Display) -> AppError {
    AppError::render(format!("Chart rendering failed: {e}"))
}

/// Multi-series line chart (yearly trends, hourly pattern).
pub fn render_lines(
    title: &str,
    x_label: &str,
    y_label: &str,
    series: &[LineSeriesData],
) -> Result<Figure, AppError> {
    let points: Vec<(f64, f64)> = series.iter().flat_map(|s| s.points.iter().copied()).collect();
    if points.is_empty() {
        return placeholder(title);
    }

    let (mut x0, mut x1) = bounds(points.iter().map(|&(x, _)| x));
    if x1 - x0 < f64::EPSILON {
        x0 -= 0.5;
        x1 += 0.5;
    }
    let y_max = points.iter().map(|&(_, y)| y).fold(0.0f64, f64::max).max(1.0) * 1.08;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(14)
            .set_label_area_size(LabelAreaPosition::Left, 64)
            .set_label_area_size(LabelAreaPosition::Bottom, 46)
            .build_cartesian_2d(x0..x1, 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .light_line_style(RGBColor(232, 232, 232))
            .label_style(("sans-serif", 13))
            .x_label_formatter(&|v| format!("{v:.0}"))
            .draw()
            .map_err(draw_err)?;

        for (i, s) in series.iter().enumerate() {
            let color = palette_color(i);
            chart
                .draw_series(LineSeries::new(
                    s.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(&s.name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
                });
            chart
                .draw_series(
                    s.points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
                )
                .map_err(draw_err)?;
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.85))
                .border_style(RGBColor(200, 200, 200))
                .label_font(("sans-serif", 13))
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }

    Ok(Figure {
        title: title.to_string(),
        svg,
    })
}

/// Bar chart over named categories; multiple series render as grouped bars.
pub fn render_bars(
    title: &str,
    y_label: &str,
    categories: &[String],
    series: &[BarSeriesData],
) -> Result<Figure, AppError> {
    let n = categories.len();
    let k = series.len();
    let y_max = series
        .iter()
        .flat_map(|s| s.values.iter().flatten())
        .fold(0.0f64, |acc, &v| acc.max(v));
    if n == 0 || k == 0 || y_max <= 0.0 {
        return placeholder(title);
    }
    let y_max = y_max * 1.08;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(14)
            .set_label_area_size(LabelAreaPosition::Left, 64)
            .set_label_area_size(LabelAreaPosition::Bottom, 46)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_label)
            .light_line_style(RGBColor(232, 232, 232))
            .label_style(("sans-serif", 12))
            .x_labels(n)
            .x_label_formatter(&|v| category_tick(v, categories))
            .draw()
            .map_err(draw_err)?;

        // Bars occupy 80% of each category slot, split evenly across series.
        let bar_w = 0.8 / k as f64;
        for (j, s) in series.iter().enumerate() {
            let series_color = palette_color(j);
            let rects = s.values.iter().enumerate().filter_map(|(i, v)| {
                let v = (*v)?;
                let left = i as f64 - 0.4 + j as f64 * bar_w;
                let color = s
                    .colors
                    .as_ref()
                    .and_then(|c| c.get(i).copied())
                    .map(rgb)
                    .unwrap_or(series_color);
                Some(Rectangle::new(
                    [(left + 0.04 * bar_w, 0.0), (left + 0.96 * bar_w, v)],
                    color.filled(),
                ))
            });
            let drawn = chart.draw_series(rects).map_err(draw_err)?;
            if k > 1 {
                drawn.label(&s.name).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], series_color.filled())
                });
            }
        }

        if k > 1 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.85))
                .border_style(RGBColor(200, 200, 200))
                .label_font(("sans-serif", 13))
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
    }

    Ok(Figure {
        title: title.to_string(),
        svg,
    })
}

/// Annotated correlation heatmap. Row 0 renders at the top.
pub fn render_heatmap(
    title: &str,
    labels: &[String],
    values: &[Vec<Option<f64>>],
) -> Result<Figure, AppError> {
    let n = labels.len();
    if n == 0 || values.iter().all(|row| row.iter().all(|v| v.is_none())) {
        return placeholder(title);
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 22))
            .margin(14)
            .set_label_area_size(LabelAreaPosition::Left, 76)
            .set_label_area_size(LabelAreaPosition::Bottom, 46)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), -0.5..(n as f64 - 0.5))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .label_style(("sans-serif", 12))
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|v| category_tick(v, labels))
            .y_label_formatter(&|v| flipped_tick(v, labels))
            .draw()
            .map_err(draw_err)?;

        for (row, row_values) in values.iter().enumerate() {
            let y = (n - 1 - row) as f64;
            for (col, value) in row_values.iter().enumerate() {
                let x = col as f64;
                let cell = Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    heat_color(*value).filled(),
                );
                chart.draw_series(std::iter::once(cell)).map_err(draw_err)?;

                if let Some(r) = value {
                    let text_color = if r.abs() > 0.6 { WHITE } else { BLACK };
                    let style = ("sans-serif", 12)
                        .into_font()
                        .color(&text_color)
                        .pos(Pos::new(HPos::Center, VPos::Center));
                    chart
                        .draw_series(std::iter::once(Text::new(
                            format!("{r:.2}"),
                            (x, y),
                            style,
                        )))
                        .map_err(draw_err)?;
                }
            }
        }

        root.present().map_err(draw_err)?;
    }

    Ok(Figure {
        title: title.to_string(),
        svg,
    })
}

/// Figure shown when a section has no data to draw.
fn placeholder(title: &str) -> Result<Figure, AppError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_SIZE.0, 120)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        root.draw(&Text::new(
            format!("{title}: no data available"),
            (24, 48),
            ("sans-serif", 18).into_font().color(&RGBColor(120, 120, 120)),
        ))
        .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    Ok(Figure {
        title: title.to_string(),
        svg,
    })
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Tick label for integer positions of a category axis; blank elsewhere.
fn category_tick(v: &f64, categories: &[String]) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    categories
        .get(i as usize)
        .map(|c| truncate_label(c, 14))
        .unwrap_or_default()
}

/// Category tick for the heatmap's y axis, where row 0 is drawn at the top.
fn flipped_tick(v: &f64, categories: &[String]) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    let idx = categories.len().checked_sub(1 + i as usize);
    idx.and_then(|idx| categories.get(idx))
        .map(|c| truncate_label(c, 14))
        .unwrap_or_default()
}

/// Diverging blue-white-red scale over [-1, 1]; grey for missing cells.
fn heat_color(value: Option<f64>) -> RGBColor {
    let Some(r) = value else {
        return RGBColor(235, 235, 235);
    };
    let t = r.clamp(-1.0, 1.0);
    let blend = |from: u8, to: u8, t: f64| -> u8 {
        (from as f64 + (to as f64 - from as f64) * t).round() as u8
    };
    if t >= 0.0 {
        // white -> warm red
        RGBColor(
            blend(255, 0xD6, t),
            blend(255, 0x27, t),
            blend(255, 0x28, t),
        )
    } else {
        // white -> steel blue
        let t = -t;
        RGBColor(
            blend(255, 0x1F, t),
            blend(255, 0x77, t),
            blend(255, 0xB4, t),
        )
    }
}

fn truncate_label(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
