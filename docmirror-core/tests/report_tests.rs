// Tests for export report generation

use docmirror_core::report::{
    ReportFormat, gather_report_data, generate_export_report, generate_text_report,
};
use docmirror_scanner::{CrawlSummary, PageRecord, SkipReason, SkippedPage};
use std::path::PathBuf;
use std::time::Duration;

fn sample_summary() -> CrawlSummary {
    CrawlSummary {
        pages: vec![
            PageRecord {
                source_url: "https://x.test/docs/".to_string(),
                local_path: PathBuf::from("out/docs/index.md"),
                title: Some("Docs".to_string()),
                asset_count: 2,
            },
            PageRecord {
                source_url: "https://x.test/docs/guide".to_string(),
                local_path: PathBuf::from("out/docs/guide.md"),
                title: None,
                asset_count: 0,
            },
        ],
        skipped: vec![
            SkippedPage {
                url: "https://x.test/docs/missing".to_string(),
                status_code: Some(404),
                reason: SkipReason::Status,
            },
            SkippedPage {
                url: "https://x.test/docs/gone".to_string(),
                status_code: Some(410),
                reason: SkipReason::Status,
            },
            SkippedPage {
                url: "https://x.test/docs/down".to_string(),
                status_code: None,
                reason: SkipReason::Network,
            },
        ],
        elapsed: Duration::from_millis(1500),
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!(ReportFormat::from_str("text"), Some(ReportFormat::Text));
    assert_eq!(ReportFormat::from_str("JSON"), Some(ReportFormat::Json));
    assert_eq!(ReportFormat::from_str("csv"), None);
}

// ============================================================================
// Report Data Tests
// ============================================================================

#[test]
fn test_gather_report_data_counts() {
    let data = gather_report_data(&sample_summary());

    assert_eq!(data.pages_written, 2);
    assert_eq!(data.pages_skipped, 3);
    assert_eq!(data.assets_mirrored, 2);
    assert_eq!(data.skipped_by_reason.get("bad status"), Some(&2));
    assert_eq!(data.skipped_by_reason.get("network error"), Some(&1));
    assert!((data.elapsed_secs - 1.5).abs() < f64::EPSILON);
}

#[test]
fn test_empty_summary() {
    let data = gather_report_data(&CrawlSummary::default());
    let report = generate_text_report(&data);

    assert!(report.contains("Pages written:   0"));
    assert!(!report.contains("## Pages"));
    assert!(!report.contains("## Skipped"));
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_text_report_lists_pages_and_skips() {
    let report = generate_export_report(&sample_summary(), ReportFormat::Text).unwrap();

    assert!(report.contains("Pages written:   2"));
    assert!(report.contains("Assets mirrored: 2"));
    assert!(report.contains("/docs/ -> out/docs/index.md (2 assets)"));
    assert!(report.contains("/docs/guide -> out/docs/guide.md\n"));
    assert!(report.contains("404 https://x.test/docs/missing (bad status)"));
    assert!(report.contains("--- https://x.test/docs/down (network error)"));
}

#[test]
fn test_json_report_is_valid() {
    let report = generate_export_report(&sample_summary(), ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(value["pages_written"], 2);
    assert_eq!(value["pages"][0]["title"], "Docs");
    assert!(value["pages"][1].get("title").is_none());
    assert_eq!(value["skipped"][0]["reason"], "status");
    assert_eq!(value["skipped"][2]["reason"], "network");
    assert!(value["skipped"][2].get("status_code").is_none());
}
