use async_trait::async_trait;

use crate::error::LlmResult;
use crate::gemini::GeminiClient;

/// Backend-agnostic text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce a single completion for `prompt`. Called once per request,
    /// never retried.
    async fn complete(&self, prompt: &str) -> LlmResult<String>;

    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        tracing::debug!("Requesting completion from {}", self.model());
        self.generate(prompt).await
    }

    fn backend_name(&self) -> &'static str {
        "gemini"
    }
}

/// Wrap a user question in the fintech assistant persona.
pub fn fintech_prompt(question: &str) -> String {
    format!(
        "You are a fintech expert. \
         Only answer fintech-related queries. \
         If unrelated, politely say so. \
         Keep your answer short, one paragraph max.\n\n\
         User question: {}",
        question
    )
}
