//! Selector evaluation over parsed documents
//!
//! This module turns a crawl target's selector strings into compiled
//! selectors and applies them to documents:
//! - Link harvesting from listing pages (block → link → `href`)
//! - Fragment link filtering
//! - Boilerplate removal
//! - Title, body and timestamp text extraction

use crate::config::CrawlTarget;
use crate::ConfigError;
use scraper::{Html, Selector};
use url::Url;

/// Compiled selectors for one crawl target
#[derive(Debug, Clone)]
pub struct SelectorSet {
    pub block: Selector,
    pub link: Selector,
    pub title: Selector,
    pub body: Selector,
    pub updated_at: Selector,
    pub remove_class: Selector,
}

impl SelectorSet {
    /// Compiles every selector of the target
    pub fn compile(target: &CrawlTarget) -> Result<Self, ConfigError> {
        Ok(Self {
            block: parse_selector("block", &target.block)?,
            link: parse_selector("article_link", &target.article_link)?,
            title: parse_selector("title", &target.title)?,
            body: parse_selector("body", &target.body)?,
            updated_at: parse_selector("article_updated_at", &target.article_updated_at)?,
            remove_class: parse_selector("remove_class", &target.remove_class)?,
        })
    }
}

/// Parses one selector, naming the field it came from on failure
pub fn parse_selector(field: &'static str, raw: &str) -> Result<Selector, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::InvalidSelector {
            field,
            message: "selector is empty".to_string(),
        });
    }

    Selector::parse(raw).map_err(|e| ConfigError::InvalidSelector {
        field,
        message: format!("{:?}", e),
    })
}

/// How newlines are treated in extracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextShape {
    /// Titles and timestamps: line breaks are stripped, surrounding
    /// whitespace is trimmed
    SingleLine,
    /// Bodies: the concatenated text is kept as is
    MultiLine,
}

/// Fields extracted from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub body: String,
    pub updated_at: String,
}

/// Collects `href` values of link elements nested in block elements
///
/// Blocks are visited in document order, and links within each block in
/// document order. A link element without an `href` is skipped; iteration
/// continues with the next one.
pub fn extract_links(doc: &Html, block: &Selector, link: &Selector) -> Vec<String> {
    let mut hrefs = Vec::new();

    for block_element in doc.select(block) {
        for link_element in block_element.select(link) {
            match link_element.value().attr("href") {
                Some(href) => hrefs.push(href.to_string()),
                None => {
                    tracing::debug!(
                        element = %link_element.value().name(),
                        "Link element has no href, skipping"
                    );
                }
            }
        }
    }

    hrefs
}

/// Returns true for links carrying a fragment (`#`)
///
/// These usually point inside the current page rather than at a new article.
pub fn is_fragment_link(href: &str) -> bool {
    href.contains('#')
}

/// Drops fragment links from harvested hrefs, keeping document order
pub fn harvestable_links(hrefs: &[String]) -> Vec<&str> {
    hrefs
        .iter()
        .map(String::as_str)
        .filter(|href| !is_fragment_link(href))
        .collect()
}

/// Resolves an href against the listing page URL
///
/// Returns None for links that cannot be resolved or do not use HTTP(S).
pub fn resolve_href(base_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = base_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Returns a copy of the document with every element matching `selector`
/// detached from the tree
pub fn remove_classes(doc: &Html, selector: &Selector) -> Html {
    let mut cleaned = doc.clone();
    let ids: Vec<_> = cleaned.select(selector).map(|element| element.id()).collect();

    for id in ids {
        if let Some(mut node) = cleaned.tree.get_mut(id) {
            node.detach();
        }
    }

    cleaned
}

/// Concatenates the text of all elements matching `selector`
pub fn extract_text(doc: &Html, selector: &Selector, shape: TextShape) -> String {
    let text: String = doc
        .select(selector)
        .flat_map(|element| element.text())
        .collect();

    match shape {
        TextShape::SingleLine => text.replace(['\n', '\r'], "").trim().to_string(),
        TextShape::MultiLine => text,
    }
}

/// Extracts title, body and update timestamp from an article page
///
/// Title and body are read after boilerplate removal. The timestamp is read
/// from the unmodified document.
pub fn extract_article(doc: &Html, selectors: &SelectorSet) -> ExtractedArticle {
    let cleaned = remove_classes(doc, &selectors.remove_class);

    ExtractedArticle {
        title: extract_text(&cleaned, &selectors.title, TextShape::SingleLine),
        body: extract_text(&cleaned, &selectors.body, TextShape::MultiLine),
        updated_at: extract_text(doc, &selectors.updated_at, TextShape::SingleLine),
    }
}
