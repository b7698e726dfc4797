pub mod asset;
pub mod crawler;
pub mod diagram;
pub mod error;
pub mod fetch;
pub mod http;
pub mod render;
pub mod result;
pub mod scope;

pub use crawler::{CrawlConfig, Crawler, ProgressCallback};
pub use error::{Result, ScanError};
pub use http::{HttpClient, RetryPolicy};
pub use result::{CrawlEvent, CrawlSummary, PageRecord, SkipReason, SkippedPage};
