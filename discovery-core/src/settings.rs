use serde::{Deserialize, Serialize};

/// Tunables for the discovery stages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Questions sent to the model per reconciliation call
    pub answer_batch_size: usize,
    /// Confidence must be strictly above this for a question to count as answered
    pub answered_confidence_threshold: f64,
    pub max_questions_per_requirement: usize,
    pub max_related_requirements: usize,
    /// Upper bound on questions kept per group after refinement
    pub refined_group_cap: usize,
    /// Existing questions summarised into new-question prompts
    pub existing_question_summary_cap: usize,
    /// Characters of transcript text sent per call
    pub max_evidence_chars: usize,
    /// Characters of document text sent per call
    pub max_document_chars: usize,
    pub max_matches_per_requirement: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            answer_batch_size: 5,
            answered_confidence_threshold: 0.8,
            max_questions_per_requirement: 5,
            max_related_requirements: 3,
            refined_group_cap: 5,
            existing_question_summary_cap: 20,
            max_evidence_chars: 30_000,
            max_document_chars: 20_000,
            max_matches_per_requirement: 20,
        }
    }
}

/// Bounded retry around model calls; zero retries means single attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff_ms: 500,
        }
    }
}

/// Truncate to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"answer_batch_size": 3}"#).unwrap();
        assert_eq!(settings.answer_batch_size, 3);
        assert_eq!(settings.max_evidence_chars, 30_000);
    }
}
