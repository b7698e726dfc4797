//! URL canonicalization, crawl scope and the URL → local path mapping.
//!
//! Everything here is deterministic: the same URL always maps to the same
//! local path, which is what lets the transformer rewrite a link to a page
//! that has not been fetched yet.

use crate::error::{Result, ScanError};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Which kind of file a URL is mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Html,
    Markdown,
}

impl PathKind {
    fn extension(self) -> &'static str {
        match self {
            PathKind::Html => "html",
            PathKind::Markdown => "md",
        }
    }

    fn index_file(self) -> &'static str {
        match self {
            PathKind::Html => "index.html",
            PathKind::Markdown => "index.md",
        }
    }
}

/// Resolve `href` against `base` and drop its fragment.
///
/// Returns `None` for missing or empty hrefs, `mailto:` and `javascript:`
/// links, pure fragments and anything `Url::join` refuses.
pub fn normalize(base: &Url, href: Option<&str>) -> Option<Url> {
    let href = href?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("mailto:") || lowered.starts_with("javascript:") {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved)
}

/// Scheme, host and port equality, with 80/443 filled in when omitted.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Segment-aware path containment: `/docs` covers `/docs` and `/docs/x`
/// but not `/docs-archive/x`.
pub fn within_scope(root: &Url, candidate: &Url) -> bool {
    let root_path = root.path().trim_end_matches('/');
    let path = candidate.path();

    if root_path.is_empty() {
        return true;
    }

    match path.strip_prefix(root_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Parse a root URL for crawling. Only http and https are accepted.
pub fn parse_root(input: &str) -> Result<Url> {
    let mut url = Url::parse(input.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", input, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ScanError::UnsupportedScheme(other.to_string())),
    }

    url.set_fragment(None);
    Ok(url)
}

/// The set of URLs a crawl is allowed to touch.
#[derive(Debug, Clone)]
pub struct Scope {
    root: Url,
}

impl Scope {
    pub fn new(root: Url) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn contains(&self, url: &Url) -> bool {
        same_origin(&self.root, url) && within_scope(&self.root, url)
    }
}

/// Map `url` to a file under `output_root`, creating its parent directory.
///
/// Directory-like paths become `index.md` (or `index.html`), paths whose last
/// segment has no extension get one appended. Empty, `.` and `..` segments
/// are dropped so the result never leaves `output_root`.
pub fn local_path(output_root: &Path, url: &Url, kind: PathKind) -> io::Result<PathBuf> {
    let mut relative = PathBuf::new();
    let url_path = url.path();

    for segment in url_path.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            continue;
        }
        relative.push(segment);
    }

    if url_path.is_empty() || url_path.ends_with('/') || relative.as_os_str().is_empty() {
        relative.push(kind.index_file());
    } else if relative.extension().is_none() {
        let mut file_name = relative
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".");
        file_name.push(kind.extension());
        relative.set_file_name(file_name);
    }

    let full_path = output_root.join(relative);
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }

    Ok(full_path)
}

/// Path of `target` relative to the directory holding `from_file`, using
/// forward slashes regardless of platform.
pub fn relative_link(from_file: &Path, target: &Path) -> String {
    let base = from_file.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(target, base).unwrap_or_else(|| target.to_path_buf());

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
