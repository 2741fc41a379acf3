//! Article extraction from raw HTML
//!
//! This module turns a fetched article page into an `ExtractedPage`:
//! - Title from the first `h1.firstHeading` (or first `h1`)
//! - Body text from the paragraph and heading blocks of the content container
//! - Child article links (root pages only), capped
//!
//! Blocks are consumed in document order until the "See also" heading.
//! Footnote markers (`<sup>` subtrees) never contribute text or links.

use crate::storage::NewArticle;
use crate::url::resolve_article_link;
use crate::ExtractError;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Title used when the page has no usable heading
pub const DEFAULT_TITLE: &str = "Title";

/// Text of the block that ends the substantive part of an article
pub const CONTENT_END_MARKER: &str = "See also";

const TITLE_SELECTORS: &[&str] = &["h1.firstHeading", "h1"];
const CONTENT_SELECTOR: &str = "div.mw-body-content";
const BLOCK_SELECTOR: &str = "p, h1, h2, h3, h4, h5, h6";
const FOOTNOTE_TAG: &str = "sup";

/// Whether a page is the entry point of a crawl or one of its children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// The crawl's entry page; child links are collected
    Root,
    /// A page reached from the root; links are ignored
    Child,
}

/// Structured record extracted from an article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Canonical URL of the page
    pub url: String,

    /// Article title, or `DEFAULT_TITLE`
    pub title: String,

    /// Block text fused into one string with line breaks removed
    pub body: String,

    /// Absolute child article URLs in first-seen order (root pages only)
    pub links: Vec<String>,

    /// False when the page had no article content container at all
    pub content_found: bool,
}

impl ExtractedPage {
    /// Converts the page into a store record
    pub fn to_new_article(&self) -> NewArticle {
        NewArticle {
            url: self.url.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

/// Extracts title, body and (for root pages) child links from an article page
///
/// # Arguments
///
/// * `html` - The raw page content
/// * `url` - The canonical URL the page was fetched from; links resolve against it
/// * `role` - Root pages collect links, child pages do not
/// * `link_limit` - Maximum number of child links collected
///
/// # Returns
///
/// * `Ok(ExtractedPage)` - Always produced for non-empty content, even when
///   the title or content container is missing
/// * `Err(ExtractError)` - The content is empty or the URL is unusable
///
/// # Example
///
/// ```
/// use wikiscribe::crawler::{extract_page, PageRole};
///
/// let html = r#"<html><body>
///     <h1 class="firstHeading">Topic</h1>
///     <div class="mw-body-content">
///         <p>Intro <a href="/wiki/Other">text</a>.<sup>[1]</sup></p>
///         <h2>See also</h2>
///         <p>Ignored</p>
///     </div>
/// </body></html>"#;
///
/// let page = extract_page(html, "https://site.example/wiki/Topic", PageRole::Root, 5).unwrap();
/// assert_eq!(page.title, "Topic");
/// assert_eq!(page.body, "Intro text.");
/// assert_eq!(page.links, vec!["https://site.example/wiki/Other".to_string()]);
/// ```
pub fn extract_page(
    html: &str,
    url: &str,
    role: PageRole,
    link_limit: usize,
) -> Result<ExtractedPage, ExtractError> {
    let page_url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    if html.trim().is_empty() {
        return Err(ExtractError::EmptyDocument {
            url: url.to_string(),
        });
    }

    let document = Html::parse_document(html);
    let title = extract_title(&document).unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let link_limit = match role {
        PageRole::Root => link_limit,
        PageRole::Child => 0,
    };

    let (body, links, content_found) = match content_container(&document) {
        Some(container) => {
            let (body, links) = extract_blocks(container, &page_url, link_limit);
            (body, links, true)
        }
        None => {
            tracing::warn!("No article content container found on {}", url);
            (String::new(), Vec::new(), false)
        }
    };

    Ok(ExtractedPage {
        url: url.to_string(),
        title,
        body,
        links,
        content_found,
    })
}

/// Extracts the article title from the document
fn extract_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

fn content_container(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse(CONTENT_SELECTOR).ok()?;
    document.select(&selector).next()
}

/// Walks the text blocks of the content container
///
/// Returns the fused body text and the collected child links.
fn extract_blocks(container: ElementRef<'_>, page_url: &Url, link_limit: usize) -> (String, Vec<String>) {
    let mut body = String::new();
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(block_selector) = Selector::parse(BLOCK_SELECTOR) else {
        return (body, links);
    };

    for block in container.select(&block_selector) {
        let mut text = String::new();
        let mut hrefs = Vec::new();
        collect_block(block, &mut text, &mut hrefs);

        if text.trim() == CONTENT_END_MARKER {
            break;
        }

        for href in hrefs {
            if links.len() >= link_limit {
                break;
            }
            if let Some(link) = resolve_article_link(href, page_url) {
                if seen.insert(link.to_string()) {
                    links.push(link.to_string());
                }
            }
        }

        body.push_str(&text);
    }

    body.retain(|c| c != '\n' && c != '\r');
    (body, links)
}

/// Appends the block's text and anchor targets, skipping footnote subtrees
fn collect_block<'a>(element: ElementRef<'a>, text: &mut String, hrefs: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => text.push_str(t),
            Node::Element(el) if el.name() == FOOTNOTE_TAG => {}
            Node::Element(el) => {
                if el.name() == "a" {
                    if let Some(href) = el.attr("href") {
                        hrefs.push(href);
                    }
                }
                if let Some(child_element) = ElementRef::wrap(child) {
                    collect_block(child_element, text, hrefs);
                }
            }
            _ => {}
        }
    }
}
