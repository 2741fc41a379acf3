//! Output module for presenting stored articles
//!
//! This module handles:
//! - Rendering a stored article with its summary and relations
//! - Loading and printing store statistics

mod article;
pub mod stats;

pub use article::{format_article, print_article};
pub use stats::{load_statistics, print_statistics, StoreStatistics};
