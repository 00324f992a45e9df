//! Formatted terminal output for the run summary.
//!
//! We keep formatting code in one place so:
//! - the aggregation code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::ReportConfig;
use crate::io::ingest::ReadingTable;
use crate::stats::AggregateResult;

/// Format the full run summary (dataset stats + headline numbers + tables).
pub fn format_run_summary(
    daily: &ReadingTable,
    hourly: Option<&ReadingTable>,
    stations: Option<&ReadingTable>,
    agg: &AggregateResult,
    config: &ReportConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== aqdash - Air Quality Report ===\n");
    out.push_str(&format!("Daily input: {}\n", config.daily_csv.display()));
    out.push_str(&format_table_line("daily", daily));
    if let Some(t) = hourly {
        out.push_str(&format_table_line("hourly", t));
    }
    if let Some(t) = stations {
        out.push_str(&format_table_line("stations", t));
    }

    let h = &agg.headline;
    out.push_str(&format!(
        "Cities: {} | Date range: {}\n",
        h.city_count,
        match (h.date_min, h.date_max) {
            (Some(lo), Some(hi)) => format!("{lo} .. {hi}"),
            _ => "n/a".to_string(),
        }
    ));
    out.push_str(&format!(
        "PM2.5: mean={} peak={}\n",
        fmt_opt(h.mean_pm25),
        fmt_opt(h.peak_pm25),
    ));

    out.push('\n');
    out.push_str("AQI category distribution:\n");
    out.push_str(&format_histogram(agg));

    if !agg.seasonal.is_empty() {
        out.push('\n');
        out.push_str("Seasonal mean PM2.5:\n");
        for (season, mean) in &agg.seasonal {
            out.push_str(&format!("  {:<10} {:>8.1}\n", season.display_name(), mean));
        }
    }

    if !agg.comparison.is_empty() {
        out.push('\n');
        out.push_str("Top cities by mean PM2.5:\n");
        out.push_str(&format_comparison(agg));
    }

    if !daily.row_errors.is_empty() {
        out.push('\n');
        out.push_str(&format!("Skipped {} bad row(s):\n", daily.row_errors.len()));
        for err in daily.row_errors.iter().take(10) {
            out.push_str(&format!(
                "  line {}: {}{}\n",
                err.line,
                err.city.as_deref().map(|c| format!("[{c}] ")).unwrap_or_default(),
                err.message
            ));
        }
        if daily.row_errors.len() > 10 {
            out.push_str(&format!("  ... and {} more\n", daily.row_errors.len() - 10));
        }
    }

    out
}

fn format_table_line(label: &str, table: &ReadingTable) -> String {
    format!(
        "  {:<9} rows={} used={} errors={}\n",
        label,
        table.rows_read,
        table.rows_used(),
        table.row_errors.len()
    )
}

/// Histogram table with counts and percentages.
pub fn format_histogram(agg: &AggregateResult) -> String {
    let total: usize = agg.histogram.iter().map(|(_, n)| n).sum();
    let mut out = String::new();
    for (category, count) in &agg.histogram {
        let pct = if total == 0 {
            0.0
        } else {
            100.0 * *count as f64 / total as f64
        };
        out.push_str(&format!(
            "  {:<14} {:>8} {:>6.1}%\n",
            category.display_name(),
            count,
            pct
        ));
    }
    out
}

/// City comparison table.
pub fn format_comparison(agg: &AggregateResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "  {:<20} {:>10} {:>10} {:>10}\n",
        "city", "PM2.5", "PM10", "NO2"
    ));
    out.push_str(&format!(
        "  {:-<20} {:-<10} {:-<10} {:-<10}\n",
        "", "", "", ""
    ));
    for row in &agg.comparison {
        out.push_str(&format!(
            "  {:<20} {:>10} {:>10} {:>10}\n",
            truncate(&row.city, 20),
            fmt_opt(row.pm25),
            fmt_opt(row.pm10),
            fmt_opt(row.no2),
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.1}"),
        None => "n/a".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregate;

    fn empty_config() -> ReportConfig {
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
    fn summary_handles_empty_run() {
        let table = ReadingTable::empty();
        let agg = aggregate(&[], &[], &[], &empty_config());
        let out = format_run_summary(&table, None, None, &agg, &empty_config());
        assert!(out.contains("Date range: n/a"));
        assert!(out.contains("mean=n/a"));
        // All six bands print with zero counts.
        assert!(out.contains("Good"));
        assert!(out.contains("Severe"));
    }

    #[test]
    fn truncate_marks_long_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("averylongcityname", 8), "averylo.");
    }
}
