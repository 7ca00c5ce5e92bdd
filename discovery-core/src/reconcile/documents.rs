use super::answers::{self, EvidenceKind};
use super::proposals::{self, Provenance, ProposalRequest};
use super::{Reconciler, StoredAnswer};
use crate::database::DocumentOutcome;
use crate::error::DiscoveryError;
use crate::extractor::DocumentExtractor;
use crate::matching;
use crate::types::{DocumentStatus, SowData};
use serde::Serialize;
use std::path::Path;

/// What happened to one supplementary document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    /// Absent when the document never got a row (missing file, failed insert)
    pub document_id: Option<i64>,
    pub filename: String,
    pub file_path: String,
    pub status: DocumentStatus,
    pub answers_found: usize,
    pub questions_generated: usize,
    pub requirement_matches: usize,
    pub answered: Vec<StoredAnswer>,
    pub new_question_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    fn new(path: &Path) -> Self {
        Self {
            document_id: None,
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            file_path: path.display().to_string(),
            status: DocumentStatus::Pending,
            answers_found: 0,
            questions_generated: 0,
            requirement_matches: 0,
            answered: Vec::new(),
            new_question_ids: Vec::new(),
            error: None,
        }
    }

    fn failed(mut self, error: impl ToString) -> Self {
        self.status = DocumentStatus::Failed;
        self.error = Some(error.to_string());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == DocumentStatus::Failed
    }
}

impl Reconciler {
    /// Reconcile one supplementary document.
    ///
    /// Never fails as a whole: problems are recorded on the report and, once
    /// the row exists, on the document row. Requirement matches found in the
    /// document are merged into `sow`; the caller persists it.
    pub async fn reconcile_document(
        &self,
        project_id: i64,
        path: &Path,
        sow: &mut SowData,
        extractor: &dyn DocumentExtractor,
    ) -> DocumentReport {
        let mut report = DocumentReport::new(path);

        let file_size = match tokio::fs::metadata(path).await {
            Ok(metadata) => i64::try_from(metadata.len()).ok(),
            Err(_) => {
                tracing::warn!(path = %report.file_path, "Document not found");
                let missing = DiscoveryError::FileNotFound(report.file_path.clone());
                return report.failed(missing);
            }
        };

        let document_id = match self.db.store_additional_document(
            project_id,
            &report.filename,
            &report.file_path,
            file_size,
        ) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(project_id, path = %report.file_path, error = %e, "Failed to register document");
                return report.failed(e);
            }
        };
        report.document_id = Some(document_id);

        let text = match extractor.extract(path).await {
            Ok(text) => text,
            Err(e) => {
                let error = DiscoveryError::Extraction {
                    path: report.file_path.clone(),
                    message: format!("{e:#}"),
                };
                tracing::warn!(document_id, error = %error, "Document extraction failed");
                return self.fail_document(report, document_id, error);
            }
        };

        let unanswered = match self.db.get_unanswered_questions(project_id) {
            Ok(questions) => questions,
            Err(e) => return self.fail_document(report, document_id, e),
        };

        let found = answers::find_answers(
            &self.generator,
            &unanswered,
            &text,
            EvidenceKind::Document,
            self.settings.answer_batch_size,
            self.settings.max_document_chars,
        )
        .await;
        report.answered = self.record_answers(found, |answer| {
            self.db.store_document_answer(
                answer.question_id,
                document_id,
                &answer.answer,
                answer.confidence,
                answer.document_section.as_deref(),
            )
        });
        report.answers_found = report.answered.len();

        let provenance = Provenance::document(&report.filename);
        let proposed = proposals::propose_questions(
            &self.generator,
            ProposalRequest {
                evidence: &text,
                kind: EvidenceKind::Document,
                existing: &unanswered,
                requirements: &sow.requirements,
                provenance: &provenance,
                existing_cap: self.settings.existing_question_summary_cap,
                max_chars: self.settings.max_document_chars,
            },
        )
        .await;
        report.new_question_ids = self.db.store_questions(&proposed, project_id);
        report.questions_generated = report.new_question_ids.len();

        let matches = matching::match_requirements_to_document(
            &sow.requirements,
            &text,
            &report.filename,
            self.settings.max_matches_per_requirement,
        );
        report.requirement_matches = matching::count_matches(&matches);
        matching::merge_matches(
            &mut sow.requirement_matches,
            matches,
            self.settings.max_matches_per_requirement,
        );

        let outcome = DocumentOutcome {
            answers_found: report.answers_found as i64,
            questions_generated: report.questions_generated as i64,
            requirement_matches: report.requirement_matches as i64,
            notes: None,
        };
        if !self
            .db
            .update_document_processing_status(document_id, DocumentStatus::Completed, &outcome)
        {
            tracing::warn!(document_id, "Document processed but status not updated");
        }
        report.status = DocumentStatus::Completed;

        tracing::info!(
            document_id,
            filename = %report.filename,
            answers = report.answers_found,
            new_questions = report.questions_generated,
            matches = report.requirement_matches,
            "Document reconciled"
        );
        report
    }

    fn fail_document(
        &self,
        report: DocumentReport,
        document_id: i64,
        error: impl ToString,
    ) -> DocumentReport {
        let report = report.failed(error);
        let outcome = DocumentOutcome {
            notes: report.error.clone(),
            ..Default::default()
        };
        if !self
            .db
            .update_document_processing_status(document_id, DocumentStatus::Failed, &outcome)
        {
            tracing::warn!(document_id, "Failed to record document failure");
        }
        report
    }
}
