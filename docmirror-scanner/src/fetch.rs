use crate::http::HttpClient;
use crate::result::FetchResult;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

/// Fetches pages and classifies them as HTML or not.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: HttpClient,
}

impl PageFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// GET `url`. Network errors come back as [`FetchResult::network_failure`]
    /// so one unreachable page never aborts a crawl.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url).await {
            Ok(response) => response,
            Err(e) => {
                debug!("Fetch of {} failed: {}", url, e);
                return FetchResult::network_failure();
            }
        };

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let is_html = content_type
            .as_ref()
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false);

        if !is_html {
            return FetchResult {
                status_code: Some(status_code),
                content_type,
                body: None,
            };
        }

        match response.text().await {
            Ok(body) => FetchResult {
                status_code: Some(status_code),
                content_type,
                body: Some(body),
            },
            Err(e) => {
                debug!("Reading body of {} failed: {}", url, e);
                FetchResult::network_failure()
            }
        }
    }
}
