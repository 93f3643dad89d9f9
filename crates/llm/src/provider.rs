use async_trait::async_trait;

/// Trait for LLM providers. Each backend implements this.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a single-prompt request and return the model's response text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("empty response body")]
    EmptyBody,
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("no candidates in response")]
    NoCandidates,
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}
