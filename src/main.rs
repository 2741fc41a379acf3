//! Wikiscribe main entry point
//!
//! This is the command-line interface for the Wikiscribe article graph builder.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wikiscribe::config::load_config_with_hash;
use wikiscribe::output::{print_article, print_statistics};
use wikiscribe::{Coordinator, CrawlOutcome, SummaryLookup};

/// Wikiscribe: an article graph builder
///
/// Wikiscribe fetches a wiki article, follows a handful of its article links
/// one level deep, stores every page in a SQLite link graph and attaches a
/// generated summary to the root article.
#[derive(Parser, Debug)]
#[command(name = "wikiscribe")]
#[command(version)]
#[command(about = "Crawl wiki articles into a summarized link graph", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "wikiscribe.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl an article and its linked articles, then summarize it
    Parse {
        /// Article URL on the configured site
        url: String,
    },

    /// Print the stored summary of an article
    Summary {
        /// Article URL on the configured site
        url: String,
    },

    /// Show a stored article with its summary, parents and children
    Show {
        /// Article URL on the configured site
        url: String,
    },

    /// Show statistics from the database
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let database_path = config.output.database_path.clone();
    let mut coordinator = Coordinator::new(config)
        .with_context(|| format!("Failed to open article store {}", database_path))?;

    match cli.command {
        Command::Parse { url } => handle_parse(&mut coordinator, &url).await,
        Command::Summary { url } => handle_summary(&coordinator, &url),
        Command::Show { url } => handle_show(&coordinator, &url),
        Command::Stats => {
            println!("Database: {}\n", database_path);
            print_statistics(&coordinator.statistics()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wikiscribe=info,warn"),
            1 => EnvFilter::new("wikiscribe=debug,info"),
            2 => EnvFilter::new("wikiscribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles `parse`: runs one crawl and reports its outcome
async fn handle_parse(coordinator: &mut Coordinator, url: &str) -> anyhow::Result<ExitCode> {
    let outcome = coordinator
        .parse_article(url)
        .await
        .with_context(|| format!("Crawl of {} failed", url))?;

    match outcome {
        CrawlOutcome::Created {
            url,
            children,
            summary_attached,
        } => {
            println!("Created {} with {} linked articles", url, children);
            if !summary_attached {
                println!("No summary was generated; see the log for details");
            }
            Ok(ExitCode::SUCCESS)
        }
        CrawlOutcome::AlreadyExists { url } => {
            println!("Article already exists: {}", url);
            Ok(ExitCode::SUCCESS)
        }
        CrawlOutcome::FetchFailed { url } => {
            eprintln!("Failed to fetch the article: {}", url);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Handles `summary`: prints the stored summary text
fn handle_summary(coordinator: &Coordinator, url: &str) -> anyhow::Result<ExitCode> {
    match coordinator.summary(url)? {
        SummaryLookup::Found(text) => {
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        SummaryLookup::ArticleNotFound => {
            eprintln!("Article not found: {}", url);
            Ok(ExitCode::FAILURE)
        }
        SummaryLookup::SummaryMissing => {
            eprintln!("Summary not found for this article: {}", url);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Handles `show`: prints a stored article with its relations
fn handle_show(coordinator: &Coordinator, url: &str) -> anyhow::Result<ExitCode> {
    match coordinator.article(url)? {
        Some(article) => {
            print_article(&article);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Article not found: {}", url);
            Ok(ExitCode::FAILURE)
        }
    }
}
