use serde::Deserialize;

use crate::models::SearchMode;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Anthropic API key
    pub anthropic_api_key: String,

    /// Anthropic API base URL
    #[serde(default = "default_anthropic_api_url")]
    pub anthropic_api_url: String,

    /// Model used to derive the shared-interest query
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,

    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: u32,

    /// Per-attempt timeout for model calls
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Total attempts for a model call, including the first
    #[serde(default = "default_llm_max_attempts")]
    pub llm_max_attempts: u32,

    /// Base delay for exponential backoff between model attempts
    #[serde(default = "default_llm_backoff_base_ms")]
    pub llm_backoff_base_ms: u64,

    /// Search index base URL
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Search index API key, sent as `Authorization: ApiKey <key>`
    #[serde(default)]
    pub search_api_key: Option<String>,

    #[serde(default = "default_search_index")]
    pub search_index: String,

    /// Maximum number of hits requested from the index
    #[serde(default = "default_search_size")]
    pub search_size: usize,

    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default = "default_search_timeout_secs")]
    pub search_timeout_secs: u64,

    /// Retry once with an amended instruction when the model breaks the tool contract
    #[serde(default = "default_clarify_on_intent_error")]
    pub clarify_on_intent_error: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_anthropic_api_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

fn default_llm_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_llm_max_attempts() -> u32 {
    3
}

fn default_llm_backoff_base_ms() -> u64 {
    500
}

fn default_search_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_search_index() -> String {
    "destinations".to_string()
}

fn default_search_size() -> usize {
    50
}

fn default_search_timeout_secs() -> u64 {
    10
}

fn default_clarify_on_intent_error() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
