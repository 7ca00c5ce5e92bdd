//! Provider name constants
//!
//! Canonical provider names used in configuration and logs

/// Anthropic (Claude) provider
pub const ANTHROPIC: &str = "anthropic";

/// Google (Gemini models)
pub const GOOGLE: &str = "google";
