//! Output formatting and persistence for aggregated reports.
//!
//! Supports JSON files, per-series CSV export, and CSV append.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::dashboard::PageReport;
use crate::error::Result;
use csv::WriterBuilder;

/// Writes a value as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    fs::write(path, json)?;
    info!(path = %path.display(), "JSON written");
    Ok(())
}

#[derive(Serialize)]
struct SeriesRow<'a> {
    category: &'a str,
    value: f64,
}

/// Writes each named categorical series of `report` to
/// `<dir>/<page>_<series>.csv` with a `category,value` header.
pub fn export_series_csv(dir: &Path, report: &PageReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let page = report.page().slug();

    let mut written = Vec::new();
    for (name, series) in report.categorical() {
        let path = dir.join(format!("{page}_{name}.csv"));
        let mut writer = WriterBuilder::new().has_headers(true).from_path(&path)?;
        for (category, value) in series.categories.iter().zip(&series.values) {
            writer.serialize(SeriesRow {
                category,
                value: *value,
            })?;
        }
        writer.flush()?;
        written.push(path);
    }

    debug!(page, files = written.len(), "Series exported");
    Ok(written)
}

/// Appends a record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::dashboard::{Page, analyze_page};
    use crate::order::fixtures::order;
    use std::env;

    #[derive(Debug, Serialize)]
    struct Row {
        timestamp: i64,
        orders: usize,
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_write_json_creates_parents() {
        let dir = temp_path("order_insights_json_test");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested/report.json");

        write_json(&path, &analyze_page(Page::Financials, &[])).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(value["page"], "financials");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_series_csv_one_file_per_series() {
        let dir = temp_path("order_insights_csv_test");
        let _ = fs::remove_dir_all(&dir);

        let orders = vec![
            order("2024-01-05T12:00:00Z", 200.0),
            order("2024-02-05T12:00:00Z", 300.0),
        ];
        let report = analyze_page(Page::Overview, &orders);
        let files = export_series_csv(&dir, &report).unwrap();

        assert_eq!(files.len(), report.categorical().len());
        let revenue = fs::read_to_string(dir.join("overview_monthly_revenue.csv")).unwrap();
        let lines: Vec<_> = revenue.lines().collect();
        assert_eq!(lines, ["category,value", "2024-01,200.0", "2024-02,300.0"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let path = temp_path("order_insights_test_header.csv");
        let _ = fs::remove_file(&path);

        append_record(&path, &Row { timestamp: 1, orders: 3 }).unwrap();
        append_record(&path, &Row { timestamp: 2, orders: 4 }).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 2 data rows
        assert_eq!(content.lines().count(), 3);

        fs::remove_file(&path).unwrap();
    }
}
