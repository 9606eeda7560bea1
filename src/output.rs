//! Output sinks: one JSON document with crawl metadata and one CSV with the
//! stable column order. The output directory is explicit configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::json;
use tracing::info;

use crate::record::{CrawlOutcome, FIELDS};

/// Write both sinks; returns the (json, csv) paths.
pub fn write_outputs(dir: &Path, label: &str, outcome: &CrawlOutcome) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let timestamp = outcome.crawl_finish.timestamp();
    let json_name = format!("{}.json", timestamp);

    let document = json!({
        "url": outcome.url,
        "file": json_name,
        "crawl_start": outcome.crawl_start.to_rfc3339(),
        "crawl_finish": outcome.crawl_finish.to_rfc3339(),
        "result": outcome.records,
    });
    let json_path = dir.join(&json_name);
    info!("Writing {}", json_path.display());
    fs::write(&json_path, serde_json::to_string_pretty(&document)?)?;

    let csv_path = dir.join(format!("{}_{}.csv", file_label(label), timestamp));
    info!("Writing {}", csv_path.display());
    fs::write(&csv_path, render_csv(outcome))?;

    Ok((json_path, csv_path))
}

/// Lowercased label with whitespace collapsed to underscores.
fn file_label(label: &str) -> String {
    let cleaned = label.to_lowercase().split_whitespace().collect::<Vec<_>>().join("_");
    if cleaned.is_empty() {
        "crawl".to_string()
    } else {
        cleaned
    }
}

fn render_csv(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();
    out.push_str(&FIELDS.join(","));
    out.push('\n');
    for record in &outcome.records {
        let row: Vec<String> = record.csv_values().iter().map(|v| csv_escape(v)).collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ListingRecord;
    use chrono::Utc;

    #[test]
    fn csv_escape_quotes_only_when_needed() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_rows_align_with_header() {
        let outcome = CrawlOutcome {
            url: "https://www.airbnb.com/s/x/homes".into(),
            crawl_start: Utc::now(),
            crawl_finish: Utc::now(),
            records: vec![ListingRecord {
                rank: 1,
                label: "Villa, lakeside".into(),
                labels: vec!["Superhost".into()],
                ..Default::default()
            }],
        };
        let csv = render_csv(&outcome);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("check_in_date,check_out_date,rank,"));
        assert!(lines[1].contains("\"Villa, lakeside\""));
    }

    #[test]
    fn file_label_is_filesystem_friendly() {
        assert_eq!(file_label("Kissimmee FL 420"), "kissimmee_fl_420");
        assert_eq!(file_label(""), "crawl");
    }
}
