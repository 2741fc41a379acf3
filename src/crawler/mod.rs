//! Crawler module for article fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with soft failure
//! - Article extraction (title, body, child links)
//! - Crawl coordination and persistence

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{Coordinator, CrawlOutcome};
pub use extractor::{extract_page, ExtractedPage, PageRole, CONTENT_END_MARKER, DEFAULT_TITLE};
pub use fetcher::{build_http_client, fetch_page, fetch_url, FetchResult};
