pub mod error;
pub mod gemini;
pub mod provider;

pub use error::{LlmError, LlmResult};
pub use gemini::GeminiClient;
pub use provider::{fintech_prompt, CompletionProvider};

use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for the language model backend
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn build_gemini(&self) -> LlmResult<GeminiClient> {
        GeminiClient::new(
            self.base_url.clone(),
            self.api_key.clone(),
            self.model.clone(),
            self.timeout,
        )
    }
}
