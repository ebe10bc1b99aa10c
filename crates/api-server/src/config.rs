use anyhow::{Context, Result};
use chat_assistant::DEFAULT_YEAR;
use llm_client::{LlmConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub llm_timeout_secs: u64,
    pub bind_addr: SocketAddr,
    pub default_year: i32,
    /// Empty means any origin is allowed.
    pub cors_allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL not set")?,
            gemini_api_key: var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            llm_timeout_secs: var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            bind_addr: var("BIND_ADDR")
                .unwrap_or_else(|| "127.0.0.1:5000".to_string())
                .parse()
                .context("BIND_ADDR must be host:port")?,
            default_year: match var("DEFAULT_YEAR") {
                Some(v) => v.parse().context("DEFAULT_YEAR must be a year")?,
                None => DEFAULT_YEAR,
            },
            cors_allowed_origins: var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(config)
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            timeout: Duration::from_secs(self.llm_timeout_secs),
        }
    }
}
