//! Configuration module for Wikiscribe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wikiscribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wikiscribe.toml")).unwrap();
//! println!("Crawling articles on {}", config.site.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, OutputConfig, SiteConfig, SummaryConfig, UserAgentConfig,
    DEFAULT_MAX_CHILD_LINKS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
