//! Claude (Anthropic) LLM client implementation

pub mod client;
pub mod types;

pub use client::ClaudeClient;

// Re-export model constants
pub use crate::models::claude::*;
