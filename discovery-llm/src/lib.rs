//! # Discovery LLM SDK
//!
//! Provider-agnostic completion client used by the discovery engine.
//! Every stage of the engine talks to a model through [`client::LlmClient`],
//! so the concrete provider is chosen once at construction time and injected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use discovery_llm::client::LlmClient;
//! use discovery_llm::gemini::GeminiClient;
//! use discovery_llm::types::{CompletionRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GeminiClient::new("your-api-key")?;
//!     let request = CompletionRequest::from_prompt(client.model_name(), "Hello, Gemini!")
//!         .with_max_tokens(256);
//!     let response = client.complete(request).await?;
//!     println!("Response: {}", response.text());
//!     Ok(())
//! }
//! ```

pub mod claude;
pub mod client;
pub mod error;
pub mod gemini;
pub mod models;
pub mod providers;
pub mod types;

#[cfg(test)]
mod tests {
    use crate::claude::ClaudeClient;
    use crate::gemini::GeminiClient;
    use crate::types::{CompletionResponse, ContentBlock, Message, Role, Usage};

    #[test]
    fn test_claude_client_creation() {
        let client = ClaudeClient::new("test-key");
        assert!(client.is_ok());
    }

    #[test]
    fn test_claude_client_creation_empty_key() {
        let client = ClaudeClient::new("");
        assert!(client.is_err());
    }

    #[test]
    fn test_gemini_client_with_model() {
        let client = GeminiClient::new("test-key")
            .unwrap()
            .with_model("gemini-2.5-pro");
        assert_eq!(client.model(), "gemini-2.5-pro");
    }

    #[test]
    fn test_message_creation() {
        let message = Message::user("Hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content.len(), 1);
        match &message.content[0] {
            ContentBlock::Text { text } => assert_eq!(text, "Hello"),
        }
    }

    #[test]
    fn test_response_text_joins_blocks() {
        let response = CompletionResponse {
            content: vec![
                ContentBlock::Text {
                    text: "first".to_string(),
                },
                ContentBlock::Text {
                    text: "second".to_string(),
                },
            ],
            role: Role::Assistant,
            usage: Usage {
                input_tokens: 1,
                output_tokens: 2,
            },
            stop_reason: None,
        };
        assert_eq!(response.text(), "first\nsecond");
    }
}
