//! Storage traits and error types
//!
//! This module defines the unit-of-work interface used by the crawl
//! coordinator and the associated error types.

use crate::storage::{Article, NewArticle};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    #[error("Article {0} already exists")]
    DuplicateUrl(String),

    #[error("Article {0} has no identity yet; flush the session first")]
    NotFlushed(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The unit of work one crawl request writes through
///
/// Mutations are staged and only reach the database on `flush`; nothing is
/// visible to other connections until the implementation commits.
/// Implementations are not safe for concurrent mutation and are driven from a
/// single task.
pub trait ArticleStore {
    /// Gets an article by canonical URL, with summary, parents and children
    ///
    /// Articles staged in this unit of work but not yet flushed are returned
    /// without identity or relations.
    fn get_by_url(&self, url: &str) -> StorageResult<Option<Article>>;

    /// Returns the article stored under `record.url`, staging a new one if none exists
    ///
    /// With a parent, a parent→child edge is staged as well; staging the
    /// same edge twice has no effect. The returned article has no identity
    /// until `flush` when it was newly staged.
    fn get_or_create_article(
        &mut self,
        record: &NewArticle,
        parent: Option<&Article>,
    ) -> StorageResult<Article>;

    /// Stages a summary for the article; an existing summary is replaced
    fn attach_summary(&mut self, content: &str, article_id: i64) -> StorageResult<()>;

    /// Writes staged articles, edges and summaries without ending the unit of work
    ///
    /// A staged article whose URL was inserted concurrently by another
    /// writer fails with `StorageError::DuplicateUrl`.
    fn flush(&mut self) -> StorageResult<()>;
}
