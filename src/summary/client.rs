use super::SummaryError;
use crate::config::SummaryConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Instruction sent as the system message of every summary request
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes articles clearly and briefly.";

const USER_PROMPT_PREFIX: &str = "Summarize the following article in 5-6 sentences:\n\n";

/// Client for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone)]
pub struct SummaryClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl SummaryClient {
    /// Builds a client from configuration
    ///
    /// The API key, when present, is sent as a bearer token on every request.
    pub fn new(config: &SummaryConfig) -> Result<Self, SummaryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match &config.api_key {
            Some(key) => {
                let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| SummaryError::Config(format!("Invalid API key format: {}", e)))?;
                auth_value.set_sensitive(true);
                headers.insert(AUTHORIZATION, auth_value);
            }
            None => tracing::warn!(
                "No API key configured for {}; requests are sent unauthenticated",
                config.endpoint
            ),
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SummaryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Requests a short summary of an article body
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The generated summary text
    /// * `Err(SummaryError::Http)` - The request could not be completed
    /// * `Err(SummaryError::UnexpectedResponse)` - The reply held no summary text
    pub async fn summarize(&self, body: &str) -> Result<String, SummaryError> {
        let user_prompt = format!("{}{}", USER_PROMPT_PREFIX, body);
        let request = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        tracing::debug!(
            "Requesting summary from {} ({} chars of article text)",
            self.endpoint,
            body.len()
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::error!("Summary endpoint returned {}: {}", status, text);
        }

        extract_content(&text).ok_or_else(|| SummaryError::UnexpectedResponse {
            status: status.as_u16(),
            body: text,
        })
    }
}

/// Pulls `choices[0].message.content` out of a completion response
fn extract_content(text: &str) -> Option<String> {
    let response: ChatResponse = serde_json::from_str(text).ok()?;
    response
        .choices
        .into_iter()
        .next()?
        .message?
        .content
        .filter(|content| !content.trim().is_empty())
}
