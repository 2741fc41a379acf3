//! SQLite storage implementation
//!
//! `SqliteStorage` owns the connection and serves read-only lookups.
//! `SqliteSession` is the unit of work one crawl writes through: it holds an
//! open `BEGIN IMMEDIATE` transaction, stages mutations in memory and writes
//! them on `flush`. Dropping a session that was not committed rolls it back.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ArticleStore, StorageError, StorageResult};
use crate::storage::{Article, LinkedArticle, NewArticle, SummaryLookup, SummaryRecord};
use crate::ScribeError;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::time::Duration;

const SELECT_ARTICLE_SQL: &str =
    "SELECT id, url, title, body, created_at FROM articles WHERE url = ?1";

const SELECT_PARENTS_SQL: &str = "SELECT a.id, a.url, a.title FROM article_links l
     JOIN articles a ON a.id = l.parent_id
     WHERE l.child_id = ?1 ORDER BY a.id";

const SELECT_CHILDREN_SQL: &str = "SELECT a.id, a.url, a.title FROM article_links l
     JOIN articles a ON a.id = l.child_id
     WHERE l.parent_id = ?1 ORDER BY a.id";

/// How long `begin` waits for another connection's write lock unless configured otherwise
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path` and initializes the schema
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScribeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScribeError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, ScribeError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Sets how long `begin` waits while another connection holds the write lock
    ///
    /// A session keeps the lock for a whole crawl, so this should cover the
    /// longest crawl another process may be running.
    pub fn set_busy_timeout(&self, timeout: Duration) -> StorageResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Opens the unit of work for one crawl request
    ///
    /// The session borrows the connection mutably, so at most one is open
    /// per storage at any time.
    pub fn begin(&mut self) -> StorageResult<SqliteSession<'_>> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        tracing::debug!("Opened storage session");

        Ok(SqliteSession {
            conn: &mut self.conn,
            pending_articles: Vec::new(),
            pending_links: Vec::new(),
            pending_summaries: Vec::new(),
            finished: false,
        })
    }

    /// Gets a committed article by URL, with summary, parents and children
    pub fn get_by_url(&self, url: &str) -> StorageResult<Option<Article>> {
        load_article(&self.conn, url)
    }

    /// Looks up the summary stored for the article at `url`
    pub fn get_summary(&self, url: &str) -> StorageResult<SummaryLookup> {
        let lookup = match load_article(&self.conn, url)? {
            None => SummaryLookup::ArticleNotFound,
            Some(article) => match article.summary {
                Some(summary) => SummaryLookup::Found(summary.content),
                None => SummaryLookup::SummaryMissing,
            },
        };
        Ok(lookup)
    }

    /// Counts stored articles
    pub fn count_articles(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM articles")
    }

    /// Counts stored summaries
    pub fn count_summaries(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM summaries")
    }

    /// Counts parent/child edges
    pub fn count_links(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM article_links")
    }

    /// Counts articles that were never discovered from another article
    pub fn count_root_articles(&self) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM articles a
             WHERE NOT EXISTS (SELECT 1 FROM article_links l WHERE l.child_id = a.id)",
        )
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Unit of work for a single crawl request
pub struct SqliteSession<'a> {
    conn: &'a mut Connection,
    pending_articles: Vec<NewArticle>,
    /// (parent URL, child URL) pairs, resolved to ids on flush
    pending_links: Vec<(String, String)>,
    /// (article id, content) pairs
    pending_summaries: Vec<(i64, String)>,
    finished: bool,
}

impl SqliteSession<'_> {
    /// Flushes staged work and commits the transaction
    pub fn commit(mut self) -> StorageResult<()> {
        self.flush()?;
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        tracing::debug!("Committed storage session");
        Ok(())
    }

    /// Discards staged and flushed work
    pub fn rollback(mut self) -> StorageResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        tracing::debug!("Rolled back storage session");
        Ok(())
    }

    fn stage_link(&mut self, parent_url: &str, child_url: &str) {
        let staged = self
            .pending_links
            .iter()
            .any(|(parent, child)| parent == parent_url && child == child_url);

        if !staged {
            self.pending_links
                .push((parent_url.to_string(), child_url.to_string()));
        }
    }
}

impl ArticleStore for SqliteSession<'_> {
    fn get_by_url(&self, url: &str) -> StorageResult<Option<Article>> {
        if let Some(staged) = self.pending_articles.iter().find(|a| a.url == url) {
            return Ok(Some(Article::pending(staged)));
        }
        load_article(&*self.conn, url)
    }

    fn get_or_create_article(
        &mut self,
        record: &NewArticle,
        parent: Option<&Article>,
    ) -> StorageResult<Article> {
        let article = match self.get_by_url(&record.url)? {
            Some(article) => article,
            None => {
                tracing::debug!("Staging new article {}", record.url);
                self.pending_articles.push(record.clone());
                Article::pending(record)
            }
        };

        if let Some(parent) = parent {
            self.stage_link(&parent.url, &article.url);
        }

        Ok(article)
    }

    fn attach_summary(&mut self, content: &str, article_id: i64) -> StorageResult<()> {
        self.pending_summaries.retain(|(id, _)| *id != article_id);
        self.pending_summaries
            .push((article_id, content.to_string()));
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();

        let articles = std::mem::take(&mut self.pending_articles);
        for record in &articles {
            insert_article(&*self.conn, record, &now)?;
        }

        let links = std::mem::take(&mut self.pending_links);
        for (parent_url, child_url) in &links {
            let parent_id = require_article_id(&*self.conn, parent_url)?;
            let child_id = require_article_id(&*self.conn, child_url)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO article_links (parent_id, child_id) VALUES (?1, ?2)",
                params![parent_id, child_id],
            )?;
        }

        let summaries = std::mem::take(&mut self.pending_summaries);
        for (article_id, content) in &summaries {
            upsert_summary(&*self.conn, *article_id, content, &now)?;
        }

        tracing::debug!(
            "Flushed {} articles, {} links, {} summaries",
            articles.len(),
            links.len(),
            summaries.len()
        );

        Ok(())
    }
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => tracing::debug!("Rolled back uncommitted storage session"),
            Err(e) => tracing::warn!("Failed to roll back storage session: {}", e),
        }
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn insert_article(conn: &Connection, record: &NewArticle, now: &str) -> StorageResult<i64> {
    match conn.execute(
        "INSERT INTO articles (url, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![record.url, record.title, record.body, now],
    ) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_constraint_violation(&e) => Err(StorageError::DuplicateUrl(record.url.clone())),
        Err(e) => Err(e.into()),
    }
}

fn upsert_summary(conn: &Connection, article_id: i64, content: &str, now: &str) -> StorageResult<()> {
    match conn.execute(
        "INSERT INTO summaries (article_id, content, created_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(article_id) DO UPDATE SET content = excluded.content, created_at = excluded.created_at",
        params![article_id, content, now],
    ) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => {
            Err(StorageError::ArticleNotFound(format!("id {}", article_id)))
        }
        Err(e) => Err(e.into()),
    }
}

fn require_article_id(conn: &Connection, url: &str) -> StorageResult<i64> {
    conn.query_row("SELECT id FROM articles WHERE url = ?1", params![url], |row| {
        row.get(0)
    })
    .optional()?
    .ok_or_else(|| StorageError::ArticleNotFound(url.to_string()))
}

fn load_article(conn: &Connection, url: &str) -> StorageResult<Option<Article>> {
    let article = conn
        .query_row(SELECT_ARTICLE_SQL, params![url], |row| {
            Ok(Article {
                id: Some(row.get(0)?),
                url: row.get(1)?,
                title: row.get(2)?,
                body: row.get(3)?,
                created_at: row.get(4)?,
                summary: None,
                parents: Vec::new(),
                children: Vec::new(),
            })
        })
        .optional()?;

    let Some(mut article) = article else {
        return Ok(None);
    };

    let id = article.require_id()?;
    article.summary = load_summary(conn, id)?;
    article.parents = load_linked(conn, SELECT_PARENTS_SQL, id)?;
    article.children = load_linked(conn, SELECT_CHILDREN_SQL, id)?;

    Ok(Some(article))
}

fn load_summary(conn: &Connection, article_id: i64) -> StorageResult<Option<SummaryRecord>> {
    let summary = conn
        .query_row(
            "SELECT id, article_id, content, created_at FROM summaries WHERE article_id = ?1",
            params![article_id],
            |row| {
                Ok(SummaryRecord {
                    id: row.get(0)?,
                    article_id: row.get(1)?,
                    content: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(summary)
}

fn load_linked(conn: &Connection, sql: &str, article_id: i64) -> StorageResult<Vec<LinkedArticle>> {
    let mut stmt = conn.prepare(sql)?;

    let linked = stmt
        .query_map(params![article_id], |row| {
            Ok(LinkedArticle {
                id: row.get(0)?,
                url: row.get(1)?,
                title: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(linked)
}
