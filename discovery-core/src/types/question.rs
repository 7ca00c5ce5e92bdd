use super::Answer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: i64,
    pub project_id: i64,
    pub parent_question_id: Option<i64>,
    pub question: String,
    pub context: String,
    /// Provenance label, e.g. "Requirement: REQ-01" or "Unclear Boundary"
    pub source: String,
    pub source_text: String,
    pub priority: u8,
    pub target_stakeholder: Option<String>,
    pub status: QuestionStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A question not yet persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewQuestion {
    pub question: String,
    pub context: String,
    pub source: String,
    pub source_text: String,
    pub priority: u8,
    pub target_stakeholder: Option<String>,
    pub parent_question_id: Option<i64>,
}

impl NewQuestion {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            priority: 3,
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, source_text: impl Into<String>) -> Self {
        self.source = source.into();
        self.source_text = source_text.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Unanswered,
    PartiallyAnswered,
    Answered,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 3] = [
        QuestionStatus::Unanswered,
        QuestionStatus::PartiallyAnswered,
        QuestionStatus::Answered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionStatus::Unanswered => "unanswered",
            QuestionStatus::PartiallyAnswered => "partially_answered",
            QuestionStatus::Answered => "answered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unanswered" => Some(QuestionStatus::Unanswered),
            "partially_answered" => Some(QuestionStatus::PartiallyAnswered),
            "answered" => Some(QuestionStatus::Answered),
            _ => None,
        }
    }

    /// Status implied by an answer's confidence; strictly above the threshold counts as answered
    pub fn from_confidence(confidence: f64, threshold: f64) -> Self {
        if confidence > threshold {
            QuestionStatus::Answered
        } else {
            QuestionStatus::PartiallyAnswered
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question together with its most recent answer, if any
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionWithAnswer {
    #[serde(flatten)]
    pub question: Question,
    pub latest_answer: Option<Answer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_threshold_is_strict() {
        assert_eq!(
            QuestionStatus::from_confidence(0.8, 0.8),
            QuestionStatus::PartiallyAnswered
        );
        assert_eq!(
            QuestionStatus::from_confidence(0.8001, 0.8),
            QuestionStatus::Answered
        );
        assert_eq!(
            QuestionStatus::from_confidence(0.1, 0.8),
            QuestionStatus::PartiallyAnswered
        );
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in QuestionStatus::ALL {
            assert_eq!(QuestionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QuestionStatus::parse("closed"), None);
    }
}
