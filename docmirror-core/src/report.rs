// Summary report for a finished export

use crate::crawl::extract_url_path;
use docmirror_scanner::{CrawlSummary, SkipReason};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub pages_written: usize,
    pub pages_skipped: usize,
    pub assets_mirrored: usize,
    pub elapsed_secs: f64,
    /// Skip counts keyed by reason, in a stable order.
    pub skipped_by_reason: BTreeMap<String, usize>,
    pub pages: Vec<PageEntry>,
    pub skipped: Vec<SkipEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntry {
    pub url: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub assets: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipEntry {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub reason: SkipReason,
}

pub fn gather_report_data(summary: &CrawlSummary) -> ReportData {
    let mut skipped_by_reason = BTreeMap::new();
    for skip in &summary.skipped {
        *skipped_by_reason
            .entry(skip.reason.as_str().to_string())
            .or_insert(0) += 1;
    }

    ReportData {
        pages_written: summary.pages.len(),
        pages_skipped: summary.skipped.len(),
        assets_mirrored: summary.asset_count(),
        elapsed_secs: summary.elapsed.as_secs_f64(),
        skipped_by_reason,
        pages: summary
            .pages
            .iter()
            .map(|p| PageEntry {
                url: p.source_url.clone(),
                path: p.local_path.display().to_string(),
                title: p.title.clone(),
                assets: p.asset_count,
            })
            .collect(),
        skipped: summary
            .skipped
            .iter()
            .map(|s| SkipEntry {
                url: s.url.clone(),
                status_code: s.status_code,
                reason: s.reason,
            })
            .collect(),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(DIVIDER);
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages written:   {}\n", data.pages_written));
    report.push_str(&format!("  Pages skipped:   {}\n", data.pages_skipped));
    for (reason, count) in &data.skipped_by_reason {
        report.push_str(&format!("    {}: {}\n", reason, count));
    }
    report.push_str(&format!("  Assets mirrored: {}\n", data.assets_mirrored));
    report.push_str(&format!("  Elapsed:         {:.1}s\n", data.elapsed_secs));
    report.push('\n');
    report.push_str(DIVIDER);

    if !data.pages.is_empty() {
        report.push_str("\n## Pages\n");
        for page in &data.pages {
            report.push_str(&format!("  {} -> {}", extract_url_path(&page.url), page.path));
            if page.assets > 0 {
                report.push_str(&format!(" ({} assets)", page.assets));
            }
            report.push('\n');
        }
    }

    if !data.skipped.is_empty() {
        report.push_str("\n## Skipped\n");
        for skip in &data.skipped {
            let status = skip
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "---".to_string());
            report.push_str(&format!("  {} {} ({})\n", status, skip.url, skip.reason.as_str()));
        }
    }

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

pub fn generate_export_report(summary: &CrawlSummary, format: ReportFormat) -> Result<String, String> {
    let data = gather_report_data(summary);

    match format {
        ReportFormat::Text => Ok(generate_text_report(&data)),
        ReportFormat::Json => {
            generate_json_report(&data).map_err(|e| format!("Failed to serialize report: {}", e))
        }
    }
}
