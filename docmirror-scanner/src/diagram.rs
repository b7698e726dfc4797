//! Mermaid diagram extraction and restoration.
//!
//! The Markdown converter would re-indent and escape diagram source, so each
//! diagram element is swapped for an opaque token before conversion and the
//! token is swapped for a fenced `mermaid` block afterwards.

use crate::error::{Result, ScanError};
use kuchiki::{ElementData, NodeRef};
use sha2::{Digest, Sha256};

const DIAGRAM_CLASS: &str = "mermaid";
const DIAGRAM_LANGUAGE: &str = "language-mermaid";
const TOKEN_PREFIX: &str = "DOCMIRRORDIAGRAM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Diagram,
    Ordinary,
}

/// A diagram lifted out of the DOM, waiting to be put back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramPlaceholder {
    pub token: String,
    pub raw_source: String,
}

fn class_contains(element: &ElementData, needle: &str) -> bool {
    element
        .attributes
        .borrow()
        .get("class")
        .map(|class| class.to_ascii_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Decide whether `node` holds diagram source.
///
/// Diagrams are `<div>`/`<pre>` elements with a `mermaid` class, or `<pre>`
/// blocks wrapping `<code class="language-mermaid">`.
pub fn classify(node: &NodeRef) -> BlockKind {
    let Some(element) = node.as_element() else {
        return BlockKind::Ordinary;
    };

    match &*element.name.local {
        "div" | "pre" if class_contains(element, DIAGRAM_CLASS) => BlockKind::Diagram,
        "pre" => {
            let tagged_code = node.children().any(|child| {
                child
                    .as_element()
                    .map(|code| &*code.name.local == "code" && class_contains(code, DIAGRAM_LANGUAGE))
                    .unwrap_or(false)
            });
            if tagged_code {
                BlockKind::Diagram
            } else {
                BlockKind::Ordinary
            }
        }
        _ => BlockKind::Ordinary,
    }
}

/// Page-specific token stem, so tokens cannot collide with page text.
pub fn token_nonce(html: &str) -> String {
    let digest = Sha256::digest(html.as_bytes());
    format!("{:x}", digest)[..12].to_string()
}

fn token(nonce: &str, index: usize) -> String {
    // The trailing `Z` keeps `N1Z` from matching inside `N10Z`.
    format!("{}{}N{}Z", TOKEN_PREFIX, nonce, index)
}

/// Replace every diagram element under `document` with a text token.
///
/// Diagrams nested in an already captured diagram are part of its text and
/// are not extracted separately.
pub fn extract_diagrams(document: &NodeRef, nonce: &str) -> Vec<DiagramPlaceholder> {
    let diagrams: Vec<NodeRef> = document
        .descendants()
        .filter(|node| classify(node) == BlockKind::Diagram)
        .collect();

    let mut placeholders = Vec::new();
    let mut captured: Vec<NodeRef> = Vec::new();

    for node in diagrams {
        if node.ancestors().any(|ancestor| captured.contains(&ancestor)) {
            continue;
        }

        let placeholder = DiagramPlaceholder {
            token: token(nonce, placeholders.len()),
            raw_source: node.text_contents(),
        };

        node.insert_before(NodeRef::new_text(placeholder.token.clone()));
        captured.push(node);
        placeholders.push(placeholder);
    }

    for node in &captured {
        node.detach();
    }

    placeholders
}

/// Swap each token in `markdown` for a fenced `mermaid` block.
///
/// Every token must appear exactly once; anything else means the converter
/// dropped or duplicated it.
pub fn restore_diagrams(markdown: &str, placeholders: &[DiagramPlaceholder]) -> Result<String> {
    let mut output = markdown.to_string();

    for placeholder in placeholders {
        let occurrences = output.matches(&placeholder.token).count();
        if occurrences != 1 {
            return Err(ScanError::DiagramPlaceholder {
                token: placeholder.token.clone(),
                occurrences,
            });
        }

        let Some(start) = output.find(&placeholder.token) else {
            continue;
        };
        let end = start + placeholder.token.len();

        // Fences must sit on their own lines; swallow the blanks around the token.
        let head = output[..start].trim_end_matches([' ', '\t']).len();
        let tail = output.len() - output[end..].trim_start_matches([' ', '\t']).len();

        let mut fenced = String::new();
        if head > 0 && !output[..head].ends_with('\n') {
            fenced.push_str("\n\n");
        }
        fenced.push_str("```mermaid\n");
        fenced.push_str(placeholder.raw_source.trim());
        fenced.push_str("\n```");
        if tail < output.len() && !output[tail..].starts_with('\n') {
            fenced.push_str("\n\n");
        }

        output.replace_range(head..tail, &fenced);
    }

    Ok(output)
}
