use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub sow_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Aggregate question/evidence counts for one project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DiscoveryStatus {
    pub total_questions: i64,
    /// Count per status; every status is present, zero when absent
    pub question_status: BTreeMap<String, i64>,
    pub transcript_count: i64,
    pub document_count: i64,
    pub discovery_complete: bool,
}

impl DiscoveryStatus {
    pub fn count(&self, status: &str) -> i64 {
        self.question_status.get(status).copied().unwrap_or(0)
    }

    /// Share of questions that are fully answered, 0.0 when there are none
    pub fn completion_ratio(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.count("answered") as f64 / self.total_questions as f64
    }
}
