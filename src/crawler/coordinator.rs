//! Crawler coordinator - one crawl request end to end
//!
//! A crawl fetches the root article, persists it, then fetches its child
//! articles and the root summary concurrently. All writes of a crawl go
//! through a single storage session that is committed once at the end.

use crate::config::Config;
use crate::crawler::{build_http_client, extract_page, fetch_page, ExtractedPage, PageRole};
use crate::output::{load_statistics, StoreStatistics};
use crate::storage::{
    open_storage, Article, ArticleStore, SqliteStorage, StorageError, SummaryLookup,
    DEFAULT_BUSY_TIMEOUT,
};
use crate::summary::SummaryClient;
use crate::url::validate_article_url;
use crate::{ConfigError, Result};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

/// Result of a crawl request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The root article and its reachable children were stored
    Created {
        /// Canonical URL of the root article
        url: String,
        /// Number of child articles linked to the root
        children: usize,
        /// Whether a generated summary was stored with the root
        summary_attached: bool,
    },

    /// The root article was already stored; nothing was written
    AlreadyExists { url: String },

    /// The root article could not be fetched; nothing was written
    FetchFailed { url: String },
}

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: SqliteStorage,
    client: Client,
    summarizer: Arc<SummaryClient>,
    site: Url,
}

impl Coordinator {
    /// Creates a new coordinator, opening the configured database
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ScribeError)` - The database or an HTTP client could not be set up
    pub fn new(config: Config) -> Result<Self> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Self::with_storage(config, storage)
    }

    /// Creates a coordinator over an already opened store
    ///
    /// The store's lock wait is raised to outlast a crawl running in another
    /// process, so a concurrent crawl of the same article ends in
    /// `AlreadyExists` rather than a locking error.
    pub fn with_storage(config: Config, storage: SqliteStorage) -> Result<Self> {
        storage.set_busy_timeout(storage_lock_wait(&config))?;

        let site = config
            .site
            .base()
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.site.base_url, e)))?;
        let client = build_http_client(&config.user_agent, &config.fetcher)?;
        let summarizer = Arc::new(SummaryClient::new(&config.summary)?);

        Ok(Self {
            config: Arc::new(config),
            storage,
            client,
            summarizer,
            site,
        })
    }

    /// Crawls the article at `url` and stores it with its children
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - Created, already stored, or root not fetchable
    /// * `Err(ScribeError)` - Invalid URL, unusable root page or storage failure;
    ///   nothing of this crawl is persisted
    pub async fn parse_article(&mut self, url: &str) -> Result<CrawlOutcome> {
        let url = validate_article_url(url, &self.site)?.to_string();

        if self.storage.get_by_url(&url)?.is_some() {
            tracing::info!("Article {} already stored", url);
            return Ok(CrawlOutcome::AlreadyExists { url });
        }

        tracing::info!("Crawling {}", url);

        let Some(html) = fetch_page(&self.client, &url).await else {
            tracing::warn!("Could not fetch root article {}", url);
            return Ok(CrawlOutcome::FetchFailed { url });
        };

        let root_page = extract_page(
            &html,
            &url,
            PageRole::Root,
            self.config.site.max_child_links,
        )?;
        tracing::debug!(
            "Root article '{}': {} chars, {} child links",
            root_page.title,
            root_page.body.len(),
            root_page.links.len()
        );

        let mut session = self.storage.begin()?;

        let root = session.get_or_create_article(&root_page.to_new_article(), None)?;
        if root.is_persisted() {
            session.rollback()?;
            tracing::info!("Article {} was stored by another writer", url);
            return Ok(CrawlOutcome::AlreadyExists { url });
        }

        match session.flush() {
            Ok(()) => {}
            Err(StorageError::DuplicateUrl(_)) => {
                session.rollback()?;
                tracing::info!("Article {} was stored by another writer", url);
                return Ok(CrawlOutcome::AlreadyExists { url });
            }
            Err(e) => return Err(e.into()),
        }

        let root = session
            .get_by_url(&url)?
            .ok_or_else(|| StorageError::ArticleNotFound(url.clone()))?;
        let root_id = root.require_id()?;

        let summary_task = {
            let summarizer = Arc::clone(&self.summarizer);
            let body = root_page.body.clone();
            tokio::spawn(async move { summarizer.summarize(&body).await })
        };
        let children = fetch_children(&self.client, &root_page.links).await;

        let summary = match summary_task.await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                tracing::warn!("Summary generation for {} failed: {}", url, e);
                None
            }
            Err(e) => {
                tracing::warn!("Summary task for {} did not complete: {}", url, e);
                None
            }
        };

        for child in &children {
            session.get_or_create_article(&child.to_new_article(), Some(&root))?;
        }

        let summary_attached = match &summary {
            Some(text) => {
                session.attach_summary(text, root_id)?;
                true
            }
            None => false,
        };

        session.commit()?;

        tracing::info!(
            "Stored {} with {}/{} children (summary: {})",
            url,
            children.len(),
            root_page.links.len(),
            if summary_attached { "yes" } else { "no" }
        );

        Ok(CrawlOutcome::Created {
            url,
            children: children.len(),
            summary_attached,
        })
    }

    /// Looks up the stored summary of the article at `url`
    pub fn summary(&self, url: &str) -> Result<SummaryLookup> {
        let url = validate_article_url(url, &self.site)?;
        Ok(self.storage.get_summary(url.as_str())?)
    }

    /// Loads the stored article at `url` with its summary and relations
    pub fn article(&self, url: &str) -> Result<Option<Article>> {
        let url = validate_article_url(url, &self.site)?;
        Ok(self.storage.get_by_url(url.as_str())?)
    }

    /// Counts what the store holds
    pub fn statistics(&self) -> Result<StoreStatistics> {
        load_statistics(&self.storage)
    }
}

/// Longest time a crawl holds the store's write lock, plus the default wait
///
/// Child fetches and the summary request run concurrently, each bounded by
/// its own timeout.
fn storage_lock_wait(config: &Config) -> Duration {
    let crawl = config.fetcher.timeout_secs + config.summary.timeout_secs;
    Duration::from_secs(crawl) + DEFAULT_BUSY_TIMEOUT
}

/// Fetches and extracts every child link concurrently
///
/// Returns the pages that could be fetched and extracted, in link order.
/// Failures are logged and skipped.
async fn fetch_children(client: &Client, links: &[String]) -> Vec<ExtractedPage> {
    let mut tasks = JoinSet::new();

    for (index, link) in links.iter().enumerate() {
        let client = client.clone();
        let link = link.clone();
        tasks.spawn(async move {
            let page = match fetch_page(&client, &link).await {
                Some(html) => match extract_page(&html, &link, PageRole::Child, 0) {
                    Ok(page) => Some(page),
                    Err(e) => {
                        tracing::warn!("Skipping child {}: {}", link, e);
                        None
                    }
                },
                None => None,
            };
            (index, page)
        });
    }

    let mut slots: Vec<Option<ExtractedPage>> = vec![None; links.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, page)) => slots[index] = page,
            Err(e) => tracing::warn!("Child fetch task did not complete: {}", e),
        }
    }

    slots.into_iter().flatten().collect()
}
