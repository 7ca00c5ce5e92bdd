use super::Database;
use crate::error::StorageError;
use crate::types::{DiscoveryStatus, QuestionStatus};
use rusqlite::params;
use std::collections::BTreeMap;

impl Database {
    /// Aggregate question counts for a project. Read-only.
    ///
    /// Discovery is complete once at least one question exists and none are
    /// unanswered or partially answered.
    pub fn get_discovery_status(&self, project_id: i64) -> Result<DiscoveryStatus, StorageError> {
        let conn = self.conn()?;

        let mut question_status: BTreeMap<String, i64> = QuestionStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();

        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM questions WHERE project_id = ?1 GROUP BY status",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (status, count) = row?;
            question_status.insert(status, count);
        }

        let transcript_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transcripts WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        let document_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM additional_documents WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;

        let total_questions: i64 = question_status.values().sum();
        let open = question_status[QuestionStatus::Unanswered.as_str()]
            + question_status[QuestionStatus::PartiallyAnswered.as_str()];

        Ok(DiscoveryStatus {
            total_questions,
            question_status,
            transcript_count,
            document_count,
            discovery_complete: total_questions > 0 && open == 0,
        })
    }
}
