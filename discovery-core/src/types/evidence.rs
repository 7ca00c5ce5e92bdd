use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transcript {
    pub id: i64,
    pub project_id: i64,
    pub meeting_date: i64,
    pub transcript_text: String,
    pub processed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdditionalDocument {
    pub id: i64,
    pub project_id: i64,
    pub filename: String,
    pub file_path: String,
    pub file_size: Option<i64>,
    pub uploaded_at: i64,
    pub processed_at: Option<i64>,
    pub processing_status: DocumentStatus,
    pub answers_found: i64,
    pub questions_generated: i64,
    pub requirement_matches: i64,
    /// Error text when processing failed
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DocumentStatus::Pending),
            "completed" => Some(DocumentStatus::Completed),
            "failed" => Some(DocumentStatus::Failed),
            _ => None,
        }
    }
}

/// Where an answer was found
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerSource {
    Transcript {
        transcript_id: i64,
    },
    Document {
        document_id: i64,
        document_section: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub source: AnswerSource,
    pub answer_text: String,
    pub confidence: f64,
    pub created_at: i64,
}

/// Information surfaced in a meeting that the SOW does not cover
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewInformationItem {
    pub id: i64,
    pub project_id: i64,
    pub transcript_id: i64,
    pub topic: String,
    pub excerpt: String,
    pub impact: InformationImpact,
    pub priority: u8,
    pub status: InformationStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InformationImpact {
    NewRequirement,
    ScopeChange,
    Clarification,
    ScopeCreep,
}

impl InformationImpact {
    pub fn as_str(&self) -> &'static str {
        match self {
            InformationImpact::NewRequirement => "new_requirement",
            InformationImpact::ScopeChange => "scope_change",
            InformationImpact::Clarification => "clarification",
            InformationImpact::ScopeCreep => "scope_creep",
        }
    }

    /// Lenient mapping of model output; anything unrecognised is a clarification
    pub fn normalize(s: &str) -> Self {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "new_requirement" => InformationImpact::NewRequirement,
            "scope_change" => InformationImpact::ScopeChange,
            "scope_creep" => InformationImpact::ScopeCreep,
            _ => InformationImpact::Clarification,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InformationStatus {
    Pending,
    Reviewed,
}

impl InformationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InformationStatus::Pending => "pending",
            InformationStatus::Reviewed => "reviewed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InformationStatus::Pending),
            "reviewed" => Some(InformationStatus::Reviewed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impact_normalization() {
        assert_eq!(
            InformationImpact::normalize("New Requirement"),
            InformationImpact::NewRequirement
        );
        assert_eq!(
            InformationImpact::normalize("scope-creep"),
            InformationImpact::ScopeCreep
        );
        assert_eq!(
            InformationImpact::normalize("something else"),
            InformationImpact::Clarification
        );
    }
}
