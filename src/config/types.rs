use serde::Deserialize;
use std::fmt;
use url::Url;

/// Number of child links followed from a root article unless configured otherwise
pub const DEFAULT_MAX_CHILD_LINKS: usize = 5;

/// Main configuration structure for Wikiscribe
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The wiki being crawled
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme, host and optional port of the site (e.g. "https://en.wikipedia.org")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum number of child articles followed from a root article
    #[serde(rename = "max-child-links", default = "default_max_child_links")]
    pub max_child_links: usize,
}

impl SiteConfig {
    /// Parses the base URL; validation guarantees this succeeds for loaded configs
    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }
}

/// Page fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Chat-completion service used for article summaries
#[derive(Clone, Deserialize)]
pub struct SummaryConfig {
    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_summary_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with every request
    #[serde(default = "default_summary_model")]
    pub model: String,

    /// Token budget for the completion
    #[serde(rename = "max-tokens", default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_summary_timeout")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// API key, resolved from `api_key_env` when the configuration is loaded
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            endpoint: default_summary_endpoint(),
            model: default_summary_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_summary_timeout(),
            api_key_env: default_api_key_env(),
            api_key: None,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_max_child_links() -> usize {
    DEFAULT_MAX_CHILD_LINKS
}

fn default_fetch_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_summary_endpoint() -> String {
    "https://openrouter.ai/api/v1/chat/completions".to_string()
}

fn default_summary_model() -> String {
    "sentientagi/dobby-mini-unhinged-plus-llama-3.1-8b".to_string()
}

fn default_max_tokens() -> u32 {
    1400
}

fn default_summary_timeout() -> u64 {
    60
}

fn default_api_key_env() -> String {
    "AI_API_KEY".to_string()
}

fn default_database_path() -> String {
    "./wikiscribe.db".to_string()
}
