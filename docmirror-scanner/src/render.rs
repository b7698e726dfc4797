//! HTML → Markdown document transformation for a single page.

use crate::asset::AssetMirror;
use crate::diagram::{extract_diagrams, restore_diagrams, token_nonce};
use crate::error::{Result, ScanError};
use crate::result::AssetRecord;
use crate::scope::{PathKind, Scope, local_path, normalize, relative_link};
use htmd::HtmlToMarkdown;
use htmd::options::{HeadingStyle, Options};
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Everything the crawler needs from one converted page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub markdown: String,
    pub title: Option<String>,
    /// In-scope links in document order, deduplicated.
    pub links: Vec<Url>,
    pub assets: Vec<AssetRecord>,
}

/// Per-crawl inputs shared by every page render.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub scope: &'a Scope,
    pub output_root: &'a Path,
    /// `None` leaves images pointing at the remote URL.
    pub assets: Option<&'a AssetMirror>,
}

fn converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "title"])
        .options(Options {
            heading_style: HeadingStyle::Atx,
            ..Default::default()
        })
        .build()
}

fn select_all(document: &NodeRef, selector: &str) -> Result<Vec<NodeDataRef<ElementData>>> {
    document
        .select(selector)
        .map(|matches| matches.collect())
        .map_err(|()| ScanError::ParseError(format!("invalid selector {}", selector)))
}

fn attribute(element: &NodeDataRef<ElementData>, name: &str) -> Option<String> {
    element.attributes.borrow().get(name).map(str::to_string)
}

fn set_attribute(element: &NodeDataRef<ElementData>, name: &str, value: String) {
    element.attributes.borrow_mut().insert(name, value);
}

fn extract_title(document: &NodeRef) -> Option<String> {
    let title = document.select_first("title").ok()?.text_contents();
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// In-scope `<a href>` targets, in document order, without repeats.
fn discover_links(anchors: &[NodeDataRef<ElementData>], page_url: &Url, scope: &Scope) -> Vec<Url> {
    let mut seen = HashSet::new();
    anchors
        .iter()
        .filter_map(|anchor| normalize(page_url, attribute(anchor, "href").as_deref()))
        .filter(|url| scope.contains(url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

fn rewrite_anchors(
    anchors: &[NodeDataRef<ElementData>],
    page_url: &Url,
    page_output_path: &Path,
    ctx: &RenderContext<'_>,
) {
    for anchor in anchors {
        let Some(target) = normalize(page_url, attribute(anchor, "href").as_deref()) else {
            continue;
        };

        if !ctx.scope.contains(&target) {
            set_attribute(anchor, "href", target.to_string());
            continue;
        }

        match local_path(ctx.output_root, &target, PathKind::Markdown) {
            Ok(target_path) => {
                let href = relative_link(page_output_path, &target_path);
                debug!("Link {} -> {}", target, href);
                set_attribute(anchor, "href", href);
            }
            Err(e) => {
                warn!("No local path for {} ({}), keeping the remote URL", target, e);
                set_attribute(anchor, "href", target.to_string());
            }
        }
    }
}

async fn rewrite_images(
    images: &[NodeDataRef<ElementData>],
    page_url: &Url,
    page_output_path: &Path,
    ctx: &RenderContext<'_>,
) -> Vec<AssetRecord> {
    let mut mirrored = Vec::new();

    for image in images {
        let Some(source) = normalize(page_url, attribute(image, "src").as_deref()) else {
            continue;
        };

        let record = match ctx.assets {
            Some(mirror) if ctx.scope.contains(&source) => mirror.mirror(&source, page_output_path).await,
            _ => None,
        };

        match record {
            Some(record) => {
                set_attribute(image, "src", record.relative_path.clone());
                mirrored.push(record);
            }
            None => set_attribute(image, "src", source.to_string()),
        }
    }

    mirrored
}

/// Convert one page to Markdown.
///
/// The HTML is parsed once; the same tree yields the title, the outgoing
/// links, the diagram sources and finally the Markdown body. Internal links
/// are rewritten through the pure path mapper, so they are correct whether
/// or not the target has been fetched yet.
pub async fn render(
    html: &str,
    page_url: &Url,
    page_output_path: &Path,
    ctx: RenderContext<'_>,
) -> Result<RenderedPage> {
    let document = kuchiki::parse_html().one(html);

    let title = extract_title(&document);
    let anchors = select_all(&document, "a[href]")?;
    let links = discover_links(&anchors, page_url, ctx.scope);

    let diagrams = extract_diagrams(&document, &token_nonce(html));

    // Anchors inside diagrams went with them.
    let anchors: Vec<_> = select_all(&document, "a[href]")?;
    rewrite_anchors(&anchors, page_url, page_output_path, &ctx);

    let images = select_all(&document, "img[src]")?;
    let assets = rewrite_images(&images, page_url, page_output_path, &ctx).await;

    let mut serialized = Vec::new();
    document.serialize(&mut serialized)?;
    let serialized = String::from_utf8(serialized)
        .map_err(|e| ScanError::ParseError(format!("serialized HTML is not UTF-8: {}", e)))?;

    let body = converter().convert(&serialized)?;

    let mut markdown = String::new();
    if let Some(ref title) = title {
        markdown.push_str("# ");
        markdown.push_str(title);
        markdown.push_str("\n\n");
    }
    markdown.push_str(&body);
    if !markdown.ends_with('\n') {
        markdown.push('\n');
    }

    let markdown = restore_diagrams(&markdown, &diagrams)?;

    Ok(RenderedPage {
        markdown,
        title,
        links,
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{DEFAULT_USER_AGENT, HttpClient, RetryPolicy};
    use tempfile::TempDir;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const ROOT: &str = "https://x.test/docs/";

    fn scope() -> Scope {
        Scope::new(Url::parse(ROOT).unwrap())
    }

    async fn render_offline(html: &str, page: &str, out: &Path) -> RenderedPage {
        let scope = scope();
        let page_url = Url::parse(page).unwrap();
        let page_path = local_path(out, &page_url, PathKind::Markdown).unwrap();
        let ctx = RenderContext {
            scope: &scope,
            output_root: out,
            assets: None,
        };
        render(html, &page_url, &page_path, ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_title_becomes_heading() {
        let out = TempDir::new().unwrap();
        let page = render_offline(
            "<html><head><title> Getting Started </title></head><body><p>Hello</p></body></html>",
            ROOT,
            out.path(),
        )
        .await;

        assert_eq!(page.title.as_deref(), Some("Getting Started"));
        assert!(page.markdown.starts_with("# Getting Started\n\n"));
        assert_eq!(page.markdown.matches("Getting Started").count(), 1);
        assert!(page.markdown.contains("Hello"));
    }

    #[tokio::test]
    async fn test_missing_title_adds_no_heading() {
        let out = TempDir::new().unwrap();
        let page = render_offline("<html><body><h2>Section</h2></body></html>", ROOT, out.path()).await;

        assert_eq!(page.title, None);
        assert!(page.markdown.trim_start().starts_with("## Section"));
    }

    #[tokio::test]
    async fn test_links_are_rewritten_by_scope() {
        let out = TempDir::new().unwrap();
        let html = r##"<html><body>
            <a href="guide">Guide</a>
            <a href="/docs/api/">API</a>
            <a href="https://x.test/blog">Blog</a>
            <a href="https://elsewhere.test/x">Elsewhere</a>
            <a href="mailto:team@x.test">Mail</a>
            <a href="#top">Top</a>
        </body></html>"##;

        let page = render_offline(html, ROOT, out.path()).await;

        assert!(page.markdown.contains("[Guide](guide.md)"));
        assert!(page.markdown.contains("[API](api/index.md)"));
        assert!(page.markdown.contains("[Blog](https://x.test/blog)"));
        assert!(page.markdown.contains("[Elsewhere](https://elsewhere.test/x)"));
        assert!(page.markdown.contains("mailto:team@x.test"));

        let links: Vec<&str> = page.links.iter().map(Url::as_str).collect();
        assert_eq!(links, vec!["https://x.test/docs/guide", "https://x.test/docs/api/"]);
    }

    #[tokio::test]
    async fn test_links_from_nested_page_climb_directories() {
        let out = TempDir::new().unwrap();
        let html = r#"<a href="../">Home</a> <a href="../intro#part">Intro</a>"#;

        let page = render_offline(html, "https://x.test/docs/guides/setup", out.path()).await;

        assert!(page.markdown.contains("[Home](../index.md)"));
        assert!(page.markdown.contains("[Intro](../intro.md)"));
    }

    #[tokio::test]
    async fn test_discovered_links_are_deduplicated() {
        let out = TempDir::new().unwrap();
        let html = r#"<a href="a">1</a><a href="a#x">2</a><a href="b">3</a><a href="a">4</a>"#;

        let page = render_offline(html, ROOT, out.path()).await;

        let links: Vec<&str> = page.links.iter().map(Url::as_str).collect();
        assert_eq!(links, vec!["https://x.test/docs/a", "https://x.test/docs/b"]);
    }

    #[tokio::test]
    async fn test_mermaid_survives_conversion() {
        let out = TempDir::new().unwrap();
        let source = "graph TD\n    A[Start] -->|yes| B{Done?}\n    B --> C\n    C -.-> A";
        let html = format!(
            r#"<html><body>
                <h1>Flow</h1>
                <div class="mermaid">
{}
                </div>
                <p>After the diagram.</p>
            </body></html>"#,
            source
        );

        let page = render_offline(&html, ROOT, out.path()).await;

        let block = format!("```mermaid\n{}\n```", source);
        assert!(page.markdown.contains(&block), "markdown was:\n{}", page.markdown);
        assert!(page.markdown.contains("After the diagram."));
        assert!(!page.markdown.contains("DOCMIRRORDIAGRAM"));
    }

    #[tokio::test]
    async fn test_code_tagged_mermaid_and_plain_code() {
        let out = TempDir::new().unwrap();
        let html = r#"<pre><code class="language-mermaid">sequenceDiagram
    Alice->>Bob: Hello | world</code></pre>
<pre><code class="language-rust">fn main() {}</code></pre>"#;

        let page = render_offline(html, ROOT, out.path()).await;

        assert!(page.markdown.contains("```mermaid\nsequenceDiagram\n    Alice->>Bob: Hello | world\n```"));
        assert!(page.markdown.contains("fn main() {}"));
    }

    #[tokio::test]
    async fn test_scripts_and_styles_are_dropped() {
        let out = TempDir::new().unwrap();
        let html = "<html><head><style>p { color: red }</style></head>\
                    <body><script>alert('x')</script><p>Visible</p></body></html>";

        let page = render_offline(html, ROOT, out.path()).await;

        assert!(page.markdown.contains("Visible"));
        assert!(!page.markdown.contains("alert"));
        assert!(!page.markdown.contains("color: red"));
    }

    #[tokio::test]
    async fn test_images_keep_absolute_url_without_mirror() {
        let out = TempDir::new().unwrap();
        let html = r#"<img src="/docs/logo.png" alt="Logo"><img src="https://cdn.test/pic.jpg" alt="Pic">"#;

        let page = render_offline(html, ROOT, out.path()).await;

        assert!(page.markdown.contains("![Logo](https://x.test/docs/logo.png)"));
        assert!(page.markdown.contains("![Pic](https://cdn.test/pic.jpg)"));
        assert!(page.assets.is_empty());
    }

    #[tokio::test]
    async fn test_images_are_mirrored_when_enabled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/docs/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/docs/broken.png"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let out = TempDir::new().unwrap();
        let root = Url::parse(&format!("{}/docs/", mock_server.uri())).unwrap();
        let scope = Scope::new(root.clone());
        let page_path = local_path(out.path(), &root, PathKind::Markdown).unwrap();
        let mirror = AssetMirror::new(HttpClient::builder(DEFAULT_USER_AGENT, 5, RetryPolicy::none()).unwrap());
        let ctx = RenderContext {
            scope: &scope,
            output_root: out.path(),
            assets: Some(&mirror),
        };

        let html = r#"<img src="/docs/logo.png" alt="Logo"><img src="broken.png" alt="Broken">"#;
        let page = render(html, &root, &page_path, ctx).await.unwrap();

        assert!(page.markdown.contains("![Logo](assets/logo.png)"));
        assert!(page.markdown.contains(&format!("![Broken]({}/docs/broken.png)", mock_server.uri())));
        assert_eq!(page.assets.len(), 1);
        assert!(out.path().join("docs/assets/logo.png").is_file());
    }

    #[tokio::test]
    async fn test_out_of_scope_images_are_not_mirrored() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/static/x.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png".to_vec()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let out = TempDir::new().unwrap();
        let root = Url::parse(&format!("{}/docs/", mock_server.uri())).unwrap();
        let scope = Scope::new(root.clone());
        let page_path = local_path(out.path(), &root, PathKind::Markdown).unwrap();
        let mirror = AssetMirror::new(HttpClient::builder(DEFAULT_USER_AGENT, 5, RetryPolicy::none()).unwrap());
        let ctx = RenderContext {
            scope: &scope,
            output_root: out.path(),
            assets: Some(&mirror),
        };

        let page = render(r#"<img src="/static/x.png" alt="X">"#, &root, &page_path, ctx)
            .await
            .unwrap();

        assert!(page.markdown.contains(&format!("![X]({}/static/x.png)", mock_server.uri())));
        assert!(page.assets.is_empty());
        assert!(!out.path().join("docs/assets").exists());
    }

    #[tokio::test]
    async fn test_link_without_local_path_keeps_remote_url() {
        let out = TempDir::new().unwrap();
        // A page saved as a plain file where a later link needs a directory.
        std::fs::create_dir_all(out.path().join("docs")).unwrap();
        std::fs::write(out.path().join("docs/v1.2"), "v1.2").unwrap();

        let html = r#"<a href="v1.2/intro">Intro</a><a href="guide">Guide</a>"#;
        let page = render_offline(html, ROOT, out.path()).await;

        assert!(page.markdown.contains("[Intro](https://x.test/docs/v1.2/intro)"));
        assert!(page.markdown.contains("[Guide](guide.md)"));
        assert_eq!(page.links.len(), 2);
    }

    #[tokio::test]
    async fn test_diagram_lost_in_conversion_is_an_error() {
        let out = TempDir::new().unwrap();
        let scope = scope();
        let page_url = Url::parse(ROOT).unwrap();
        let page_path = local_path(out.path(), &page_url, PathKind::Markdown).unwrap();
        let ctx = RenderContext {
            scope: &scope,
            output_root: out.path(),
            assets: None,
        };

        // An SVG <title> holds HTML content but is skipped by the converter.
        let html = r#"<p>x</p><svg><title><div class="mermaid">graph TD; A-->B;</div></title></svg>"#;
        let result = render(html, &page_url, &page_path, ctx).await;

        assert!(matches!(
            result,
            Err(ScanError::DiagramPlaceholder { occurrences: 0, .. })
        ));
    }
}
