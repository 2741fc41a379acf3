//! URL handling module for Wikiscribe
//!
//! This module provides URL canonicalization, validation of inbound article
//! URLs against the configured site, and the in-wiki article link pattern.

mod article;
mod normalize;

pub use article::{is_article_href, resolve_article_link, validate_article_url, ARTICLE_PATH_PREFIX};
pub use normalize::canonicalize_url;
