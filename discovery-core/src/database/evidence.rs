use super::{now, touch_project, Database};
use crate::error::StorageError;
use crate::types::{
    AdditionalDocument, Answer, AnswerSource, DocumentStatus, InformationImpact,
    InformationStatus, NewInformationItem, Transcript,
};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

/// Counts recorded against a document once processing ends
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentOutcome {
    pub answers_found: i64,
    pub questions_generated: i64,
    pub requirement_matches: i64,
    pub notes: Option<String>,
}

/// New-information candidate before it is persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInformation {
    pub topic: String,
    pub excerpt: String,
    pub impact: InformationImpact,
    pub priority: u8,
}

impl Database {
    // Transcripts

    pub fn store_transcript(&self, project_id: i64, text: &str) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transcripts (project_id, meeting_date, transcript_text) VALUES (?1, ?2, ?3)",
            params![project_id, now(), text],
        )?;
        let id = conn.last_insert_rowid();
        touch_project(&conn, project_id)?;
        Ok(id)
    }

    pub fn mark_transcript_processed(&self, transcript_id: i64) -> bool {
        let result = self.conn().and_then(|conn| {
            Ok(conn.execute(
                "UPDATE transcripts SET processed = 1 WHERE id = ?1",
                params![transcript_id],
            )?)
        });
        match result {
            Ok(updated) => updated > 0,
            Err(e) => {
                tracing::error!(transcript_id, error = %e, "Failed to mark transcript processed");
                false
            }
        }
    }

    pub fn list_transcripts(&self, project_id: i64) -> Result<Vec<Transcript>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, meeting_date, transcript_text, processed
                FROM transcripts WHERE project_id = ?1 ORDER BY meeting_date, id",
        )?;
        let transcripts = stmt
            .query_map(params![project_id], |row| {
                Ok(Transcript {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    meeting_date: row.get(2)?,
                    transcript_text: row.get(3)?,
                    processed: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(transcripts)
    }

    /// Record an answer found in a transcript. Returns false on failure.
    pub fn store_answer(
        &self,
        question_id: i64,
        transcript_id: i64,
        answer_text: &str,
        confidence: f64,
    ) -> bool {
        let result = self.conn().and_then(|conn| {
            Ok(conn.execute(
                &format!(
                    "INSERT INTO answers (question_id, transcript_id, answer_text, confidence, created_at, seq)
                        VALUES (?1, ?2, ?3, ?4, ?5, {NEXT_ANSWER_SEQ})"
                ),
                params![question_id, transcript_id, answer_text, confidence.clamp(0.0, 1.0), now()],
            )?)
        });
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(question_id, transcript_id, error = %e, "Failed to store answer");
                false
            }
        }
    }

    // Additional documents

    /// Register an uploaded document in `pending` state
    pub fn store_additional_document(
        &self,
        project_id: i64,
        filename: &str,
        file_path: &str,
        file_size: Option<i64>,
    ) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO additional_documents (project_id, filename, file_path, file_size, uploaded_at)
                VALUES (?1, ?2, ?3, ?4, ?5)",
            params![project_id, filename, file_path, file_size, now()],
        )?;
        let id = conn.last_insert_rowid();
        touch_project(&conn, project_id)?;
        Ok(id)
    }

    /// Overwrite a document's status and counters; the row itself is kept on failure
    pub fn update_document_processing_status(
        &self,
        document_id: i64,
        status: DocumentStatus,
        outcome: &DocumentOutcome,
    ) -> bool {
        let result = self.conn().and_then(|conn| {
            let processed_at = match status {
                DocumentStatus::Pending => None,
                _ => Some(now()),
            };
            Ok(conn.execute(
                "UPDATE additional_documents SET
                    processing_status = ?1, processed_at = ?2, content_extracted = ?3,
                    answers_found = ?4, questions_generated = ?5, requirement_matches = ?6, notes = ?7
                    WHERE id = ?8",
                params![
                    status.as_str(),
                    processed_at,
                    status == DocumentStatus::Completed,
                    outcome.answers_found,
                    outcome.questions_generated,
                    outcome.requirement_matches,
                    outcome.notes,
                    document_id
                ],
            )?)
        });
        match result {
            Ok(updated) => updated > 0,
            Err(e) => {
                tracing::error!(document_id, error = %e, "Failed to update document status");
                false
            }
        }
    }

    pub fn get_additional_document(
        &self,
        document_id: i64,
    ) -> Result<Option<AdditionalDocument>, StorageError> {
        let conn = self.conn()?;
        let document = conn
            .query_row(
                &format!("SELECT {DOCUMENT_COLUMNS} FROM additional_documents WHERE id = ?1"),
                params![document_id],
                document_from_row,
            )
            .optional()?;
        Ok(document)
    }

    pub fn list_additional_documents(
        &self,
        project_id: i64,
    ) -> Result<Vec<AdditionalDocument>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM additional_documents WHERE project_id = ?1 ORDER BY id"
        ))?;
        let documents = stmt
            .query_map(params![project_id], document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    /// Record an answer found in a supplementary document. Returns false on failure.
    pub fn store_document_answer(
        &self,
        question_id: i64,
        document_id: i64,
        answer_text: &str,
        confidence: f64,
        document_section: Option<&str>,
    ) -> bool {
        let result = self.conn().and_then(|conn| {
            Ok(conn.execute(
                &format!(
                    "INSERT INTO document_answers
                        (question_id, document_id, answer_text, confidence, document_section, created_at, seq)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, {NEXT_ANSWER_SEQ})"
                ),
                params![
                    question_id,
                    document_id,
                    answer_text,
                    confidence.clamp(0.0, 1.0),
                    document_section,
                    now()
                ],
            )?)
        });
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(question_id, document_id, error = %e, "Failed to store document answer");
                false
            }
        }
    }

    /// Most recent answer for a question from either provenance
    pub fn latest_answer(&self, question_id: i64) -> Result<Option<Answer>, StorageError> {
        Ok(self.answers_for_question(question_id)?.pop())
    }

    /// All answers for a question, oldest first
    pub fn answers_for_question(&self, question_id: i64) -> Result<Vec<Answer>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, question_id, 'transcript' AS kind, transcript_id, NULL, answer_text, confidence, created_at, seq
                FROM answers WHERE question_id = ?1
             UNION ALL
             SELECT id, question_id, 'document' AS kind, document_id, document_section, answer_text, confidence, created_at, seq
                FROM document_answers WHERE question_id = ?1
             ORDER BY seq, created_at, id",
        )?;
        let answers = stmt
            .query_map(params![question_id], |row| {
                let kind: String = row.get(2)?;
                let source = if kind == "document" {
                    AnswerSource::Document {
                        document_id: row.get(3)?,
                        document_section: row.get(4)?,
                    }
                } else {
                    AnswerSource::Transcript {
                        transcript_id: row.get(3)?,
                    }
                };
                Ok(Answer {
                    id: row.get(0)?,
                    question_id: row.get(1)?,
                    source,
                    answer_text: row.get(5)?,
                    confidence: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(answers)
    }

    // New information

    pub fn store_new_information(
        &self,
        project_id: i64,
        transcript_id: i64,
        items: &[NewInformation],
    ) -> Vec<i64> {
        let conn = match self.conn() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(project_id, error = %e, "Cannot store new information");
                return Vec::new();
            }
        };
        let now = now();

        items
            .iter()
            .filter_map(|item| {
                let result = conn.execute(
                    "INSERT INTO new_information
                        (project_id, transcript_id, topic, excerpt, impact, priority, status, created_at)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7)",
                    params![
                        project_id,
                        transcript_id,
                        item.topic,
                        item.excerpt,
                        item.impact.as_str(),
                        item.priority.clamp(1, 3),
                        now
                    ],
                );
                match result {
                    Ok(_) => Some(conn.last_insert_rowid()),
                    Err(e) => {
                        tracing::warn!(project_id, topic = %item.topic, error = %e, "Skipping new information item");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn list_new_information(
        &self,
        project_id: i64,
    ) -> Result<Vec<NewInformationItem>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, transcript_id, topic, excerpt, impact, priority, status, created_at
                FROM new_information WHERE project_id = ?1 ORDER BY priority, id",
        )?;
        let items = stmt
            .query_map(params![project_id], |row| {
                let impact: String = row.get(5)?;
                let status: String = row.get(7)?;
                Ok(NewInformationItem {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    transcript_id: row.get(2)?,
                    topic: row.get(3)?,
                    excerpt: row.get(4)?,
                    impact: InformationImpact::normalize(&impact),
                    priority: row.get(6)?,
                    status: InformationStatus::parse(&status).unwrap_or(InformationStatus::Pending),
                    created_at: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

/// Next position in the insertion order shared by transcript and document answers
const NEXT_ANSWER_SEQ: &str = "(SELECT COALESCE(MAX(seq), 0) + 1 FROM
    (SELECT seq FROM answers UNION ALL SELECT seq FROM document_answers))";

const DOCUMENT_COLUMNS: &str = "id, project_id, filename, file_path, file_size, uploaded_at,
    processed_at, processing_status, answers_found, questions_generated, requirement_matches, notes";

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<AdditionalDocument> {
    let status: String = row.get(7)?;
    Ok(AdditionalDocument {
        id: row.get(0)?,
        project_id: row.get(1)?,
        filename: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        uploaded_at: row.get(5)?,
        processed_at: row.get(6)?,
        processing_status: DocumentStatus::parse(&status).unwrap_or(DocumentStatus::Pending),
        answers_found: row.get(8)?,
        questions_generated: row.get(9)?,
        requirement_matches: row.get(10)?,
        notes: row.get(11)?,
    })
}
