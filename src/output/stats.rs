//! Statistics generation from the article database
//!
//! This module provides functionality for extracting and displaying
//! store statistics from the storage layer.

use crate::storage::SqliteStorage;
use crate::ScribeError;

/// What the article store currently holds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Total number of stored articles
    pub articles: u64,

    /// Number of articles with a summary
    pub summaries: u64,

    /// Number of parent/child edges
    pub links: u64,

    /// Articles not reachable from any other article
    pub root_articles: u64,
}

/// Loads statistics from storage
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(ScribeError)` - Failed to query statistics
pub fn load_statistics(storage: &SqliteStorage) -> Result<StoreStatistics, ScribeError> {
    Ok(StoreStatistics {
        articles: storage.count_articles()?,
        summaries: storage.count_summaries()?,
        links: storage.count_links()?,
        root_articles: storage.count_root_articles()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Article Store Statistics ===\n");

    println!("Overview:");
    println!("  Articles stored: {}", stats.articles);
    println!("  Root articles: {}", stats.root_articles);
    println!("  Parent/child links: {}", stats.links);
    println!();

    let coverage = if stats.articles > 0 {
        (stats.summaries as f64 / stats.articles as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Summaries: {} ({:.1}% of articles)",
        stats.summaries, coverage
    );
}
