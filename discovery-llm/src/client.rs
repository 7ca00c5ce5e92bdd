use crate::{
    error::LlmError,
    types::{CompletionRequest, CompletionResponse},
};
use async_trait::async_trait;

/// Core trait for LLM clients
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a request (non-streaming)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Get provider name (e.g., "google", "anthropic")
    fn provider_name(&self) -> &str;

    /// Get model name (e.g., "gemini-2.0-flash", "claude-sonnet-4-5")
    fn model_name(&self) -> &str;
}
