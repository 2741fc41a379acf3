//! Wikiscribe: an article graph builder
//!
//! This crate crawls a single encyclopedia article, follows a bounded set of
//! in-wiki links one level deep, stores every page as a node in a parent/child
//! link graph keyed by canonical URL, and attaches a generated summary to
//! the root article.

pub mod config;
pub mod crawler;
pub mod output;
pub mod storage;
pub mod summary;
pub mod url;

use thiserror::Error;

/// Main error type for Wikiscribe operations
#[derive(Debug, Error)]
pub enum ScribeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Summary error: {0}")]
    Summary(#[from] summary::SummaryError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("URL {url} is not on the configured site {site}")]
    ForeignSite { url: String, site: String },

    #[error("URL {0} is not an article URL (expected /wiki/<title>)")]
    NotArticle(String),
}

/// Errors raised when a fetched page cannot be turned into an article record
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Empty document for {url}")]
    EmptyDocument { url: String },

    #[error("Invalid page URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Result type alias for Wikiscribe operations
pub type Result<T> = std::result::Result<T, ScribeError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlOutcome};
pub use storage::{Article, SummaryLookup};
pub use url::{canonicalize_url, validate_article_url};
