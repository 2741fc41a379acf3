//! Storage module for persisting the article graph
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Get-or-create of articles keyed by canonical URL
//! - Parent/child link tracking
//! - Summary attachment
//! - The per-crawl unit of work (`SqliteSession`)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{SqliteSession, SqliteStorage, DEFAULT_BUSY_TIMEOUT};
pub use traits::{ArticleStore, StorageError, StorageResult};

use crate::ScribeError;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScribeError> {
    SqliteStorage::new(path)
}

/// An article record as handed to the store for get-or-create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub url: String,
    pub title: String,
    pub body: String,
}

/// An article, loaded together with its summary and graph neighbours
#[derive(Debug, Clone)]
pub struct Article {
    /// Database identity; `None` until the article has been flushed
    pub id: Option<i64>,
    pub url: String,
    pub title: String,
    pub body: String,
    pub created_at: Option<String>,
    pub summary: Option<SummaryRecord>,
    /// Articles this one was discovered from
    pub parents: Vec<LinkedArticle>,
    /// Articles discovered from this one
    pub children: Vec<LinkedArticle>,
}

impl Article {
    /// Builds a not-yet-persisted article from a record
    pub fn pending(record: &NewArticle) -> Self {
        Self {
            id: None,
            url: record.url.clone(),
            title: record.title.clone(),
            body: record.body.clone(),
            created_at: None,
            summary: None,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns true once the article has been assigned an identity
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the identity, failing if the article has not been flushed yet
    pub fn require_id(&self) -> StorageResult<i64> {
        self.id
            .ok_or_else(|| StorageError::NotFlushed(self.url.clone()))
    }
}

/// A neighbour in the article graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedArticle {
    pub id: i64,
    pub url: String,
    pub title: String,
}

/// A stored summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub id: i64,
    pub article_id: i64,
    pub content: String,
    pub created_at: String,
}

/// Outcome of looking up the summary for an article URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryLookup {
    /// The article exists and has a summary
    Found(String),
    /// No article is stored under the URL
    ArticleNotFound,
    /// The article exists but no summary was attached
    SummaryMissing,
}
