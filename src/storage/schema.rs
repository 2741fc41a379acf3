//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Wikiscribe database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per canonical article URL
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- At most one summary per article
CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL UNIQUE REFERENCES articles(id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Parent/child edges; the graph may contain cycles and self-loops
CREATE TABLE IF NOT EXISTS article_links (
    parent_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    child_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    PRIMARY KEY (parent_id, child_id)
);

CREATE INDEX IF NOT EXISTS idx_article_links_child ON article_links(child_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
