use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a single page GET. All fields `None` means the request never
/// produced a response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub status_code: Option<u16>,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

impl FetchResult {
    pub fn network_failure() -> Self {
        Self::default()
    }

    pub fn is_network_failure(&self) -> bool {
        self.status_code.is_none()
    }
}

/// A page that was converted and written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub source_url: String,
    pub local_path: PathBuf,
    pub title: Option<String>,
    pub asset_count: usize,
}

/// A mirrored asset, placed in the referring page's `assets/` folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub source_url: String,
    pub local_path: PathBuf,
    /// Path relative to the referring page, e.g. `assets/logo.png`.
    pub relative_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No response at all (DNS, connect, timeout, broken body).
    Network,
    /// A response other than 200.
    Status,
    /// 200, but not HTML.
    NotHtml,
    /// The page could not be converted.
    Render,
    /// The page has no usable local path, or writing it failed.
    Output,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Network => "network error",
            SkipReason::Status => "bad status",
            SkipReason::NotHtml => "not html",
            SkipReason::Render => "render failed",
            SkipReason::Output => "output failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPage {
    pub url: String,
    pub status_code: Option<u16>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub pages: Vec<PageRecord>,
    pub skipped: Vec<SkippedPage>,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn asset_count(&self) -> usize {
        self.pages.iter().map(|p| p.asset_count).sum()
    }
}

/// Progress notifications emitted by the crawler.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    Fetching { url: String },
    Saved { url: String, path: PathBuf },
    Skipped { url: String, reason: SkipReason },
}
