//! HTML content extractor
//!
//! Parses an HTML page into its title, meta description, visible text, and
//! outbound links. Parsing is html5ever-based and error-recovering, so
//! malformed markup degrades to best-effort fields instead of failing the
//! page.

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Structured content pulled out of one HTML page
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    /// Content of the title element, trimmed (empty if absent)
    pub title: String,

    /// Content attribute of the meta description tag (empty if absent)
    pub description: String,

    /// Visible text, whitespace-normalized to single spaces
    pub text: String,

    /// Absolute hyperlink targets, deduplicated in first-seen order
    pub links: Vec<Url>,
}

/// File extensions that are never worth fetching as pages
const SKIPPED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png", ".gif", ".css", ".js"];

/// Extracts structured content from HTML
///
/// Relative link targets are resolved against `base_url`.
pub fn extract_content(html: &str, base_url: &Url) -> ExtractedContent {
    let document = Html::parse_document(html);

    ExtractedContent {
        title: extract_title(&document),
        description: extract_description(&document),
        text: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

fn extract_title(document: &Html) -> String {
    let selector = match Selector::parse("title") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_description(document: &Html) -> String {
    let selector = match Selector::parse(r#"meta[name="description"]"#) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

/// Concatenates visible text nodes, excluding script/style subtrees
fn extract_text(document: &Html) -> String {
    let mut raw = String::new();
    collect_text(document.tree.root(), &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(&text.text);
                out.push(' ');
            }
            Node::Element(element) => {
                if !matches!(element.name(), "script" | "style" | "noscript") {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    for element in document.select(&selector) {
        if let Some(href) = element.value().attr("href") {
            if let Some(resolved) = resolve_link(href, base_url) {
                if seen.insert(resolved.as_str().to_string()) {
                    links.push(resolved);
                }
            }
        }
    }

    links
}

/// Resolves an href to an absolute URL, or None if it should be skipped
///
/// Skipped: empty hrefs, same-page fragments, javascript:/mailto:/tel:/data:
/// targets, non-HTTP(S) results, and asset extensions.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(href).ok()?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    let path = resolved.path().to_lowercase();
    if SKIPPED_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return None;
    }

    Some(resolved)
}
