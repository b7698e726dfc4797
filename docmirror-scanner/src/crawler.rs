use crate::asset::AssetMirror;
use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::http::HttpClient;
use crate::render::{RenderContext, render};
use crate::result::{CrawlEvent, CrawlSummary, FetchResult, PageRecord, SkipReason, SkippedPage};
use crate::scope::{PathKind, Scope, local_path, parse_root};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub type ProgressCallback = Arc<dyn Fn(CrawlEvent) + Send + Sync>;

/// Settings for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub root_url: String,
    pub output_dir: PathBuf,
    /// Stop after this many pages have been written. `None` means no cap.
    pub max_pages: Option<usize>,
    /// Pause after every written page.
    pub delay: Duration,
    pub download_assets: bool,
}

/// Breadth-first crawler. Owns all crawl state; one instance per crawl.
pub struct Crawler {
    scope: Scope,
    config: CrawlConfig,
    fetcher: PageFetcher,
    assets: AssetMirror,
    frontier: VecDeque<Url>,
    visited: HashSet<Url>,
    enqueued: HashSet<Url>,
    processed: usize,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    /// Validate the root URL and set up an empty frontier.
    ///
    /// Fails before any request is made if the root is not http(s).
    pub fn new(config: CrawlConfig) -> Result<Self> {
        Self::with_client(config, HttpClient::new()?)
    }

    pub fn with_client(config: CrawlConfig, client: HttpClient) -> Result<Self> {
        let root = parse_root(&config.root_url)?;

        Ok(Self {
            scope: Scope::new(root),
            config,
            fetcher: PageFetcher::new(client.clone()),
            assets: AssetMirror::new(client),
            frontier: VecDeque::new(),
            visited: HashSet::new(),
            enqueued: HashSet::new(),
            processed: 0,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn root(&self) -> &Url {
        self.scope.root()
    }

    fn emit(&self, event: CrawlEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    fn cap_reached(&self) -> bool {
        self.config.max_pages.is_some_and(|max| self.processed >= max)
    }

    /// Queue `url` unless it was already processed or is already waiting.
    fn enqueue(&mut self, url: Url) {
        if self.visited.contains(&url) || !self.enqueued.insert(url.clone()) {
            return;
        }
        debug!("Queued {}", url);
        self.frontier.push_back(url);
    }

    fn skip(&self, summary: &mut CrawlSummary, url: &Url, fetched: &FetchResult, reason: SkipReason) {
        warn!(
            "skip {} ({}, status {})",
            url,
            reason.as_str(),
            fetched
                .status_code
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        summary.skipped.push(SkippedPage {
            url: url.to_string(),
            status_code: fetched.status_code,
            reason,
        });
        self.emit(CrawlEvent::Skipped {
            url: url.to_string(),
            reason,
        });
    }

    /// Run the crawl to completion.
    ///
    /// Stops when the frontier is empty or `max_pages` pages were written.
    /// Only an unusable output directory aborts the crawl; every per-page
    /// problem skips that page.
    pub async fn crawl(mut self) -> Result<CrawlSummary> {
        let start = Instant::now();
        let mut summary = CrawlSummary::default();

        info!(
            "Starting crawl of {} into {}",
            self.scope.root(),
            self.config.output_dir.display()
        );

        tokio::fs::create_dir_all(&self.config.output_dir).await?;
        let root = self.scope.root().clone();
        self.enqueue(root);

        while !self.cap_reached() {
            let Some(url) = self.frontier.pop_front() else {
                break;
            };

            if !self.visited.insert(url.clone()) {
                continue;
            }

            self.emit(CrawlEvent::Fetching { url: url.to_string() });
            let fetched = self.fetcher.fetch(&url).await;

            let html = match (&fetched.status_code, &fetched.body) {
                (None, _) => {
                    self.skip(&mut summary, &url, &fetched, SkipReason::Network);
                    continue;
                }
                (Some(200), Some(body)) => body,
                (Some(200), None) => {
                    self.skip(&mut summary, &url, &fetched, SkipReason::NotHtml);
                    continue;
                }
                (Some(_), _) => {
                    self.skip(&mut summary, &url, &fetched, SkipReason::Status);
                    continue;
                }
            };

            let page_path = match local_path(&self.config.output_dir, &url, PathKind::Markdown) {
                Ok(page_path) => page_path,
                Err(e) => {
                    warn!("No output path for {}: {}", url, e);
                    self.skip(&mut summary, &url, &fetched, SkipReason::Output);
                    continue;
                }
            };
            let ctx = RenderContext {
                scope: &self.scope,
                output_root: &self.config.output_dir,
                assets: self.config.download_assets.then_some(&self.assets),
            };

            let rendered = match render(html, &url, &page_path, ctx).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!("Could not convert {}: {}", url, e);
                    self.skip(&mut summary, &url, &fetched, SkipReason::Render);
                    continue;
                }
            };

            if let Err(e) = tokio::fs::write(&page_path, rendered.markdown.as_bytes()).await {
                warn!("Could not write {}: {}", page_path.display(), e);
                self.skip(&mut summary, &url, &fetched, SkipReason::Output);
                continue;
            }
            self.processed += 1;
            info!("Saved {} -> {}", url, page_path.display());

            self.emit(CrawlEvent::Saved {
                url: url.to_string(),
                path: page_path.clone(),
            });
            summary.pages.push(PageRecord {
                source_url: url.to_string(),
                local_path: page_path,
                title: rendered.title,
                asset_count: rendered.assets.len(),
            });

            for link in rendered.links {
                self.enqueue(link);
            }

            if !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
        }

        summary.elapsed = start.elapsed();
        info!(
            "Crawl complete. Wrote {} pages, skipped {}",
            summary.pages.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}
