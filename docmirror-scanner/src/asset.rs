use crate::http::HttpClient;
use crate::result::AssetRecord;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use url::Url;

pub const ASSETS_DIR: &str = "assets";

/// Downloads same-origin assets next to the page that references them.
#[derive(Debug, Clone)]
pub struct AssetMirror {
    client: HttpClient,
}

impl AssetMirror {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Stream `asset_url` into `<page dir>/assets/`.
    ///
    /// Returns `None` on any failure; the caller then keeps the remote URL.
    pub async fn mirror(&self, asset_url: &Url, page_output_path: &Path) -> Option<AssetRecord> {
        let response = match self.client.get(asset_url).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Asset {} unavailable: {}", asset_url, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            warn!("Asset {} answered {}", asset_url, response.status());
            return None;
        }

        let page_dir = page_output_path.parent().unwrap_or_else(|| Path::new(""));
        let assets_dir = page_dir.join(ASSETS_DIR);
        if let Err(e) = fs::create_dir_all(&assets_dir).await {
            warn!("Cannot create {}: {}", assets_dir.display(), e);
            return None;
        }

        let file_name = asset_file_name(asset_url);
        let local_path = assets_dir.join(&file_name);

        let file = match fs::File::create(&local_path).await {
            Ok(file) => file,
            Err(e) => {
                warn!("Cannot create {}: {}", local_path.display(), e);
                return None;
            }
        };

        if !save_body(file, response.bytes_stream(), &local_path).await {
            return None;
        }

        debug!("Mirrored {} -> {}", asset_url, local_path.display());

        Some(AssetRecord {
            source_url: asset_url.to_string(),
            local_path,
            relative_path: format!("{}/{}", ASSETS_DIR, file_name),
        })
    }
}

/// Copy `body` into `file`. On any failure the partial file at `local_path`
/// is removed and `false` is returned.
async fn save_body<W, S, B, E>(mut file: W, mut body: S, local_path: &Path) -> bool
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let copied = copy_body(&mut file, &mut body).await;
    drop(file);

    match copied {
        Ok(()) => true,
        Err(e) => {
            warn!("Writing {} failed: {}", local_path.display(), e);
            let _ = fs::remove_file(local_path).await;
            false
        }
    }
}

async fn copy_body<W, S, B, E>(file: &mut W, body: &mut S) -> std::result::Result<(), String>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    while let Some(chunk) = body.next().await {
        let bytes = chunk.map_err(|e| format!("download interrupted: {}", e))?;
        file.write_all(bytes.as_ref()).await.map_err(|e| e.to_string())?;
    }
    file.flush().await.map_err(|e| format!("flush failed: {}", e))
}

/// Basename of the URL path, or the SHA-256 of the URL when there is none.
pub fn asset_file_name(asset_url: &Url) -> String {
    let basename = asset_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    if basename.is_empty() || basename == "." || basename == ".." {
        let digest = Sha256::digest(asset_url.as_str().as_bytes());
        return format!("{:x}", digest);
    }

    basename.replace(['\\', '/'], "_")
}
