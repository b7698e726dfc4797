use docmirror_scanner::http::{DEFAULT_USER_AGENT, HttpClient, RetryPolicy};
use docmirror_scanner::{CrawlConfig, CrawlEvent, CrawlSummary, Crawler, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Options for one export run, as collected by a front-end.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_pages: Option<usize>,
    pub delay: Duration,
    pub download_assets: bool,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

/// Callback for forwarding crawl events to the caller
pub type ExportEventCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() { "/".to_string() } else { path }
        })
        .unwrap_or_else(|| url.to_string())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Starting export...");
    pb
}

/// Run a full export with the given options.
///
/// Errors are fatal ones only (bad root URL, unwritable output); skipped pages
/// are reported in the returned summary.
pub async fn execute_export(
    options: ExportOptions,
    event_callback: Option<ExportEventCallback>,
) -> Result<CrawlSummary, String> {
    let ExportOptions {
        url,
        output_dir,
        max_pages,
        delay,
        download_assets,
        timeout_secs,
        show_progress,
    } = options;

    info!("Exporting {} into {}", url, output_dir.display());
    debug!(
        "max_pages={:?} delay={:?} assets={} timeout={}s",
        max_pages, delay, download_assets, timeout_secs
    );

    let client = HttpClient::builder(DEFAULT_USER_AGENT, timeout_secs, RetryPolicy::default())
        .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

    let config = CrawlConfig {
        root_url: url.clone(),
        output_dir,
        max_pages,
        delay,
        download_assets,
    };

    let mut crawler = Crawler::with_client(config, client).map_err(|e| e.to_string())?;

    let progress_bar = show_progress.then(spinner);
    let saved = Arc::new(AtomicUsize::new(0));

    if progress_bar.is_some() || event_callback.is_some() {
        let pb_clone = progress_bar.clone();
        let saved_clone = saved.clone();
        let callback: ProgressCallback = Arc::new(move |event: CrawlEvent| {
            if let Some(ref pb) = pb_clone {
                match &event {
                    CrawlEvent::Fetching { url } => {
                        pb.set_message(format!(
                            "[{} saved] Fetching {}",
                            saved_clone.load(Ordering::Relaxed),
                            extract_url_path(url)
                        ));
                    }
                    CrawlEvent::Saved { .. } => {
                        saved_clone.fetch_add(1, Ordering::Relaxed);
                    }
                    CrawlEvent::Skipped { url, reason } => {
                        pb.println(format!("  skipped {} ({})", url, reason.as_str()));
                    }
                }
            }
            if let Some(ref cb) = event_callback {
                cb(event);
            }
        });
        crawler = crawler.with_progress_callback(callback);
    }

    let result = crawler.crawl().await;

    if let Some(ref pb) = progress_bar {
        match &result {
            Ok(summary) => pb.finish_with_message(format!(
                "Export complete! {} pages written",
                summary.pages.len()
            )),
            Err(_) => pb.abandon_with_message("Export aborted"),
        }
    }

    result.map_err(|e| format!("Export of {} failed: {}", url, e))
}
