use super::{now, touch_project, Database};
use crate::error::StorageError;
use crate::types::{NewQuestion, Question, QuestionStatus};
use rusqlite::{params, OptionalExtension, Row};

const QUESTION_COLUMNS: &str = "id, project_id, parent_question_id, question, context, source,
    source_text, priority, target_stakeholder, status, created_at, updated_at";

impl Database {
    /// Insert questions one at a time; failures are logged and skipped.
    ///
    /// Returns the ids of the rows that were written, in input order.
    pub fn store_questions(&self, questions: &[NewQuestion], project_id: i64) -> Vec<i64> {
        let conn = match self.conn() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(project_id, error = %e, "Cannot store questions");
                return Vec::new();
            }
        };
        let now = now();

        let mut ids = Vec::with_capacity(questions.len());
        for (index, q) in questions.iter().enumerate() {
            let result = conn.execute(
                "INSERT INTO questions
                    (project_id, parent_question_id, question, context, source, source_text,
                     priority, target_stakeholder, status, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'unanswered', ?9, ?9)",
                params![
                    project_id,
                    q.parent_question_id,
                    q.question.trim(),
                    q.context,
                    q.source,
                    q.source_text,
                    q.priority.clamp(1, 3),
                    q.target_stakeholder,
                    now
                ],
            );

            match result {
                Ok(_) => ids.push(conn.last_insert_rowid()),
                Err(e) => {
                    tracing::warn!(project_id, index, error = %e, "Skipping question that failed to insert");
                }
            }
        }

        if !ids.is_empty() {
            if let Err(e) = touch_project(&conn, project_id) {
                tracing::warn!(project_id, error = %e, "Failed to bump project timestamp");
            }
        }

        tracing::debug!(
            project_id,
            requested = questions.len(),
            stored = ids.len(),
            "Stored questions"
        );
        ids
    }

    pub fn get_question(&self, question_id: i64) -> Result<Option<Question>, StorageError> {
        let conn = self.conn()?;
        let question = conn
            .query_row(
                &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
                params![question_id],
                question_from_row,
            )
            .optional()?;
        Ok(question)
    }

    /// Unanswered questions, highest priority (1) first
    pub fn get_unanswered_questions(&self, project_id: i64) -> Result<Vec<Question>, StorageError> {
        self.get_questions(project_id, Some(QuestionStatus::Unanswered))
    }

    /// Questions for a project, optionally filtered by status.
    ///
    /// Filtered results are ordered by priority then id; unfiltered results
    /// are grouped by status first.
    pub fn get_questions(
        &self,
        project_id: i64,
        status: Option<QuestionStatus>,
    ) -> Result<Vec<Question>, StorageError> {
        let conn = self.conn()?;

        let questions = match status {
            Some(status) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {QUESTION_COLUMNS} FROM questions
                        WHERE project_id = ?1 AND status = ?2 ORDER BY priority, id"
                ))?;
                let rows = stmt.query_map(params![project_id, status.as_str()], question_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {QUESTION_COLUMNS} FROM questions
                        WHERE project_id = ?1 ORDER BY status, priority, id"
                ))?;
                let rows = stmt.query_map(params![project_id], question_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(questions)
    }

    /// Set a question's status and bump updated_at.
    ///
    /// Accepts any valid status in any order; monotonicity is the caller's
    /// concern. Returns false when no row was updated.
    pub fn update_question_status(&self, question_id: i64, status: QuestionStatus) -> bool {
        let result = self.conn().and_then(|conn| {
            let now = now();
            let updated = conn.execute(
                "UPDATE questions SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), now, question_id],
            )?;
            if updated > 0 {
                conn.execute(
                    "UPDATE projects SET updated_at = ?1
                        WHERE id = (SELECT project_id FROM questions WHERE id = ?2)",
                    params![now, question_id],
                )?;
            }
            Ok(updated)
        });

        match result {
            Ok(0) => {
                tracing::warn!(question_id, "No question updated");
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::error!(question_id, error = %e, "Failed to update question status");
                false
            }
        }
    }
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    let status: String = row.get(9)?;
    Ok(Question {
        id: row.get(0)?,
        project_id: row.get(1)?,
        parent_question_id: row.get(2)?,
        question: row.get(3)?,
        context: row.get(4)?,
        source: row.get(5)?,
        source_text: row.get(6)?,
        priority: row.get(7)?,
        target_stakeholder: row.get(8)?,
        status: QuestionStatus::parse(&status).unwrap_or(QuestionStatus::Unanswered),
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}
