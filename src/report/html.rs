//! Static HTML dashboard assembly.
//!
//! The document layout follows the original dashboard: header, headline stat
//! cards, PM2.5/PM10 reference sections, the CPCB band legend, one card per
//! figure, and a generation-timestamp footer. Figures are embedded as inline
//! SVG, so the file is fully self-contained.

use std::fs;
use std::path::Path;

use chrono::Local;

use crate::domain::{AqiCategory, ReportConfig};
use crate::error::AppError;
use crate::plot::Figure;
use crate::stats::AggregateResult;

const CSS: &str = "\
* { margin: 0; padding: 0; box-sizing: border-box; }\n\
body { font-family: 'Segoe UI', Tahoma, sans-serif; background: #eef1f6; padding: 24px; }\n\
.container { max-width: 1280px; margin: 0 auto; }\n\
header { background: #fff; padding: 28px; border-radius: 12px; margin-bottom: 24px; text-align: center; box-shadow: 0 4px 14px rgba(0,0,0,0.08); }\n\
h1 { color: #2c3e50; font-size: 2.1em; margin-bottom: 6px; }\n\
.subtitle { color: #7f8c8d; font-size: 1.1em; }\n\
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 18px; margin-bottom: 24px; }\n\
.stat-card { background: #fff; padding: 22px; border-radius: 12px; text-align: center; box-shadow: 0 3px 10px rgba(0,0,0,0.07); }\n\
.stat-value { font-size: 2.2em; font-weight: bold; color: #3498db; margin: 8px 0; }\n\
.stat-label { color: #7f8c8d; font-size: 0.9em; text-transform: uppercase; letter-spacing: 1px; }\n\
.card { background: #fff; padding: 24px; margin: 18px 0; border-radius: 12px; box-shadow: 0 4px 14px rgba(0,0,0,0.08); }\n\
.card h2 { color: #2c3e50; margin-bottom: 16px; font-size: 1.4em; border-left: 5px solid #3498db; padding-left: 12px; }\n\
.card svg { width: 100%; height: auto; }\n\
.info-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 16px; }\n\
.info-item { background: #f8f9fa; padding: 16px; border-radius: 8px; border-left: 4px solid #3498db; line-height: 1.6; color: #2c3e50; }\n\
.info-item strong { color: #e74c3c; display: block; margin-bottom: 6px; }\n\
.aqi-row { padding: 12px 16px; border-radius: 6px; display: flex; justify-content: space-between; margin-bottom: 8px; }\n\
.aqi-category { font-weight: bold; min-width: 180px; }\n\
footer { background: #fff; padding: 16px; border-radius: 12px; text-align: center; margin-top: 24px; color: #7f8c8d; box-shadow: 0 3px 10px rgba(0,0,0,0.07); }\n\
.timestamp { font-size: 0.85em; color: #95a5a6; margin-top: 6px; }\n";

/// Assemble the full document. Pure string building; no I/O.
pub fn render_document(agg: &AggregateResult, figures: &[Figure], config: &ReportConfig) -> String {
    let mut html = String::with_capacity(256 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"UTF-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(&config.title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"container\">\n");

    push_header(&mut html, agg, config);
    push_stat_cards(&mut html, agg);
    push_reference_sections(&mut html);

    for figure in figures {
        html.push_str("<div class=\"card\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape(&figure.title)));
        html.push_str(&figure.svg);
        html.push('\n');
        html.push_str("</div>\n");
    }

    html.push_str("<footer>\n<strong>Air Quality Dashboard</strong> | Data Analysis &amp; Visualization\n");
    html.push_str(&format!(
        "<div class=\"timestamp\">Generated on {}</div>\n",
        Local::now().format("%B %d, %Y at %I:%M %p")
    ));
    html.push_str("</footer>\n</div>\n</body>\n</html>\n");

    html
}

/// Render and write the dashboard.
pub fn write_report(
    path: &Path,
    agg: &AggregateResult,
    figures: &[Figure],
    config: &ReportConfig,
) -> Result<(), AppError> {
    let html = render_document(agg, figures, config);
    fs::write(path, html).map_err(|e| {
        AppError::io_write(format!("Failed to write report '{}': {e}", path.display()))
    })
}

fn push_header(html: &mut String, agg: &AggregateResult, config: &ReportConfig) {
    let range = match (agg.headline.date_min, agg.headline.date_max) {
        (Some(lo), Some(hi)) => format!("{} - {}", lo.format("%Y"), hi.format("%Y")),
        _ => "no data".to_string(),
    };
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape(&config.title)));
    html.push_str(&format!(
        "<div class=\"subtitle\">Indian Cities Environmental Monitoring ({range})</div>\n"
    ));
    html.push_str("</header>\n");
}

fn push_stat_cards(html: &mut String, agg: &AggregateResult) {
    let fmt = |v: Option<f64>, digits: usize| match v {
        Some(v) => format!("{v:.digits$}"),
        None => "n/a".to_string(),
    };

    html.push_str("<div class=\"stats-grid\">\n");
    for (label, value, unit) in [
        ("Average PM2.5", fmt(agg.headline.mean_pm25, 1), "µg/m³"),
        ("Peak PM2.5", fmt(agg.headline.peak_pm25, 0), "µg/m³"),
        ("Cities Monitored", agg.headline.city_count.to_string(), "Locations"),
    ] {
        html.push_str("<div class=\"stat-card\">\n");
        html.push_str(&format!("<div class=\"stat-label\">{label}</div>\n"));
        html.push_str(&format!("<div class=\"stat-value\">{value}</div>\n"));
        html.push_str(&format!("<div class=\"stat-label\">{unit}</div>\n"));
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");
}

fn push_reference_sections(html: &mut String) {
    html.push_str("<div class=\"card\">\n<h2>About PM2.5 &amp; PM10</h2>\n<div class=\"info-grid\">\n");
    for (name, text) in [
        (
            "PM2.5",
            "Fine particulate matter with a diameter of 2.5 micrometers or less. \
             Penetrates deep into lungs and bloodstream. \
             WHO guideline: 15 µg/m³ annual | Indian standard: 40 µg/m³ annual.",
        ),
        (
            "PM10",
            "Coarse particulate matter with a diameter of 10 micrometers or less. \
             Affects the upper respiratory tract. \
             WHO guideline: 45 µg/m³ annual | Indian standard: 60 µg/m³ annual.",
        ),
    ] {
        html.push_str(&format!(
            "<div class=\"info-item\"><strong>{name}</strong>{text}</div>\n"
        ));
    }
    html.push_str("</div>\n</div>\n");

    html.push_str("<div class=\"card\">\n<h2>AQI Categories &amp; Health Implications</h2>\n");
    for category in AqiCategory::ALL {
        let (r, g, b) = category.color();
        // Light text on the darker bands.
        let fg = match category {
            AqiCategory::Good | AqiCategory::Satisfactory => "#2c3e50",
            _ => "#fff",
        };
        html.push_str(&format!(
            "<div class=\"aqi-row\" style=\"background: rgb({r},{g},{b}); color: {fg};\">\
             <span class=\"aqi-category\">{} ({})</span><span>{}</span></div>\n",
            category.display_name(),
            category.range_label(),
            category.health_note(),
        ));
    }
    html.push_str("</div>\n");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;

    fn config() -> ReportConfig {
        ReportConfig {
            daily_csv: "city_day.csv".into(),
            hourly_csv: None,
            station_csv: None,
            out_path: "dashboard.html".into(),
            title: "Air Quality Analysis Dashboard".to_string(),
            focus_city: "Delhi".to_string(),
            top_trend: 8,
            top_compare: 12,
            trim_quantile: None,
            export_tables: None,
            export_summary: None,
        }
    }

    #[test]
    fn empty_run_still_produces_a_valid_document() {
        let agg = aggregate(&[], &[], &[], &config());
        let html = render_document(&agg, &[], &config());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Air Quality Analysis Dashboard</h1>"));
        assert!(html.contains("no data"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn figures_are_embedded_inline() {
        let agg = aggregate(&[], &[], &[], &config());
        let figures = vec![Figure {
            title: "Trend <test>".to_string(),
            svg: "<svg></svg>".to_string(),
        }];
        let html = render_document(&agg, &figures, &config());
        assert!(html.contains("<h2>Trend &lt;test&gt;</h2>"));
        assert!(html.contains("<svg></svg>"));
    }

    #[test]
    fn all_six_bands_appear_in_the_legend() {
        let agg = aggregate(&[], &[], &[], &config());
        let html = render_document(&agg, &[], &config());
        for category in AqiCategory::ALL {
            assert!(html.contains(category.display_name()));
        }
    }

    #[test]
    fn write_report_fails_with_io_exit_code() {
        let agg = aggregate(&[], &[], &[], &config());
        let err = write_report(
            Path::new("/nonexistent-dir/report.html"),
            &agg,
            &[],
            &config(),
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
