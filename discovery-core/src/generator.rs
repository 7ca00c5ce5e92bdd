use crate::settings::RetryPolicy;
use discovery_llm::client::LlmClient;
use discovery_llm::error::LlmError;
use discovery_llm::types::CompletionRequest;
use std::sync::Arc;
use std::time::Duration;

/// Prompt-in, text-out facade over an injected [`LlmClient`].
///
/// Each stage holds a clone; the client itself is shared.
#[derive(Clone)]
pub struct TextGenerator {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: Option<f32>,
    retry: RetryPolicy,
}

impl TextGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            max_tokens: 8192,
            temperature: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Send one prompt and return the response text.
    ///
    /// Retries only errors the client reports as retryable, doubling the
    /// delay each time.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 0;
        loop {
            let request = CompletionRequest::from_prompt(self.client.model_name(), prompt)
                .with_max_tokens(self.max_tokens)
                .with_temperature(self.temperature);

            match self.client.complete(request).await {
                Ok(response) => return Ok(response.text()),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff_ms.saturating_mul(1u64 << attempt.min(16));
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay,
                        error = %e,
                        "Model call failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLlm;

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::rate_limit("busy", None)),
            Ok("never reached".to_string()),
        ]));
        let generator = TextGenerator::new(llm.clone());

        assert!(generator.generate("hi").await.is_err());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retries_retryable_errors() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::rate_limit("busy", None)),
            Ok("done".to_string()),
        ]));
        let generator = TextGenerator::new(llm.clone()).with_retry(RetryPolicy {
            max_retries: 2,
            backoff_ms: 1,
        });

        assert_eq!(generator.generate("hi").await.unwrap(), "done");
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_auth_errors() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            Err(LlmError::authentication("bad key")),
            Ok("never reached".to_string()),
        ]));
        let generator = TextGenerator::new(llm.clone()).with_retry(RetryPolicy {
            max_retries: 3,
            backoff_ms: 1,
        });

        assert!(generator.generate("hi").await.is_err());
        assert_eq!(llm.call_count(), 1);
    }
}
