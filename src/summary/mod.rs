//! Article summary generation
//!
//! Summaries come from an OpenAI-compatible chat completions endpoint. The
//! client is cheap to clone and safe to move into a spawned task.

mod client;

pub use client::{SummaryClient, SYSTEM_PROMPT};

use thiserror::Error;

/// Errors raised while generating a summary
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Summary request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected summary response (status {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("Summary client configuration error: {0}")]
    Config(String),
}
