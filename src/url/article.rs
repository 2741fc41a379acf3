//! Article URL rules
//!
//! An article lives under `/wiki/<title>`. Titles containing a colon belong to
//! a non-article namespace (`File:`, `Help:`, `Special:` ...) and are not
//! followed, and neither are fragment links.

use crate::url::canonicalize_url;
use crate::UrlError;
use url::Url;

/// Path prefix shared by every article on the site
pub const ARTICLE_PATH_PREFIX: &str = "/wiki/";

/// Returns true if `href` is a site-relative link to an article
///
/// Matches `^/wiki/[^:#]+$`.
///
/// # Examples
///
/// ```
/// use wikiscribe::url::is_article_href;
///
/// assert!(is_article_href("/wiki/Rust_(programming_language)"));
/// assert!(!is_article_href("/wiki/File:Logo.svg"));
/// assert!(!is_article_href("/wiki/Rust#History"));
/// assert!(!is_article_href("https://example.com/wiki/Rust"));
/// ```
pub fn is_article_href(href: &str) -> bool {
    match href.strip_prefix(ARTICLE_PATH_PREFIX) {
        Some(title) => !title.is_empty() && !title.contains([':', '#']),
        None => false,
    }
}

/// Resolves an anchor `href` found on `page_url` to a canonical article URL
///
/// Returns `None` when the href is not an in-wiki article link.
pub fn resolve_article_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if !is_article_href(href) {
        return None;
    }

    let joined = page_url.join(href).ok()?;
    canonicalize_url(joined.as_str()).ok()
}

/// Validates an inbound article URL and returns its canonical form
///
/// The URL must use `http` or `https`, live on the same host (and explicit
/// port) as `site`, and point at `/wiki/<title>` with a non-empty title.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use wikiscribe::url::validate_article_url;
///
/// let site = Url::parse("https://en.wikipedia.org").unwrap();
/// let url = validate_article_url("https://en.wikipedia.org/wiki/YouTube", &site).unwrap();
/// assert_eq!(url.path(), "/wiki/YouTube");
///
/// assert!(validate_article_url("https://example.com/wiki/YouTube", &site).is_err());
/// ```
pub fn validate_article_url(url_str: &str, site: &Url) -> Result<Url, UrlError> {
    let url = canonicalize_url(url_str)?;

    // Explicit ports must match; scheme default ports are not compared
    let same_site = url.host_str() == site.host_str() && url.port() == site.port();
    if !same_site {
        return Err(UrlError::ForeignSite {
            url: url.to_string(),
            site: site.to_string(),
        });
    }

    match url.path().strip_prefix(ARTICLE_PATH_PREFIX) {
        Some(title) if !title.is_empty() => Ok(url),
        _ => Err(UrlError::NotArticle(url.to_string())),
    }
}
