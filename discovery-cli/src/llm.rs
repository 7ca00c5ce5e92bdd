use crate::config::DiscoveryConfig;
use anyhow::{anyhow, bail};
use discovery_core::{RetryPolicy, TextGenerator};
use discovery_llm::claude::ClaudeClient;
use discovery_llm::client::LlmClient;
use discovery_llm::gemini::GeminiClient;
use discovery_llm::providers;
use std::sync::Arc;

/// Build the configured provider client; missing credentials are fatal
pub fn create_llm_client(config: &DiscoveryConfig) -> anyhow::Result<Arc<dyn LlmClient>> {
    let llm = &config.llm;

    let client: Arc<dyn LlmClient> = match llm.provider.as_str() {
        providers::GOOGLE | "gemini" => {
            let api_key = config.api_keys.google_api_key.clone().ok_or_else(|| {
                anyhow!("No Google API key. Set GOOGLE_API_KEY or api_keys.google_api_key.")
            })?;
            let mut client = GeminiClient::new(api_key)?;
            if let Some(model) = &llm.model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        providers::ANTHROPIC | "claude" => {
            let api_key = config.api_keys.anthropic_api_key.clone().ok_or_else(|| {
                anyhow!("No Anthropic API key. Set ANTHROPIC_API_KEY or api_keys.anthropic_api_key.")
            })?;
            let mut client = ClaudeClient::new(api_key)?;
            if let Some(model) = &llm.model {
                client = client.with_model(model);
            }
            Arc::new(client)
        }
        other => bail!("Unknown LLM provider: {other}"),
    };

    tracing::info!(
        provider = client.provider_name(),
        model = client.model_name(),
        "Using LLM provider"
    );
    Ok(client)
}

pub fn create_generator(config: &DiscoveryConfig, client: Arc<dyn LlmClient>) -> TextGenerator {
    TextGenerator::new(client)
        .with_max_tokens(config.llm.max_tokens)
        .with_temperature(config.llm.temperature)
        .with_retry(RetryPolicy {
            max_retries: config.llm.max_retries,
            backoff_ms: config.llm.retry_backoff_ms,
        })
}
