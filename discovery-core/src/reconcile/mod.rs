//! Evidence reconciliation.
//!
//! Transcripts and supplementary documents go through the same steps:
//! persist the evidence, look for answers to unanswered questions in
//! batches, record each answer and advance its question, then propose new
//! questions the evidence raises. Transcripts also feed new-information
//! detection against the recorded scope.

pub mod answers;
mod documents;
pub mod proposals;


use crate::database::{Database, NewInformation};
use crate::error::DiscoveryError;
use crate::generator::TextGenerator;
use crate::settings::EngineSettings;
use crate::types::{QuestionStatus, SowData};
use answers::{EvidenceKind, FoundAnswer};
use proposals::{Provenance, ProposalRequest};
use serde::Serialize;
use std::sync::Arc;

pub use documents::DocumentReport;

/// Outcome of a reconciliation run that may have had nothing to do
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<T> {
    /// The project had no unanswered questions; nothing was stored
    NoQuestions,
    Completed(T),
}

/// An answer that was written, with the status it gave its question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAnswer {
    pub question_id: i64,
    pub answer: String,
    pub confidence: f64,
    pub status: QuestionStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptReport {
    pub transcript_id: i64,
    pub questions_processed: usize,
    pub answers_found: usize,
    pub answered: Vec<StoredAnswer>,
    pub new_question_ids: Vec<i64>,
    pub new_information: Vec<NewInformation>,
    pub new_information_ids: Vec<i64>,
}

pub struct Reconciler {
    db: Arc<Database>,
    generator: TextGenerator,
    settings: EngineSettings,
}

impl Reconciler {
    pub fn new(db: Arc<Database>, generator: TextGenerator, settings: EngineSettings) -> Self {
        Self {
            db,
            generator,
            settings,
        }
    }

    /// Reconcile one meeting transcript against the project's open questions
    pub async fn reconcile_transcript(
        &self,
        project_id: i64,
        transcript: &str,
    ) -> Result<Reconciliation<TranscriptReport>, DiscoveryError> {
        let unanswered = self.db.get_unanswered_questions(project_id)?;
        if unanswered.is_empty() {
            tracing::info!(project_id, "No unanswered questions, transcript not stored");
            return Ok(Reconciliation::NoQuestions);
        }

        let transcript_id = self.db.store_transcript(project_id, transcript)?;
        tracing::info!(
            project_id,
            transcript_id,
            questions = unanswered.len(),
            "Reconciling transcript"
        );

        let found = answers::find_answers(
            &self.generator,
            &unanswered,
            transcript,
            EvidenceKind::Transcript,
            self.settings.answer_batch_size,
            self.settings.max_evidence_chars,
        )
        .await;
        let answered = self.record_answers(found, |answer| {
            self.db.store_answer(
                answer.question_id,
                transcript_id,
                &answer.answer,
                answer.confidence,
            )
        });

        let sow = self.load_sow(project_id);
        let requirements = sow.as_ref().map(|s| s.requirements.as_slice()).unwrap_or_default();
        let provenance = Provenance::transcript(transcript_id);
        let proposed = proposals::propose_questions(
            &self.generator,
            ProposalRequest {
                evidence: transcript,
                kind: EvidenceKind::Transcript,
                existing: &unanswered,
                requirements,
                provenance: &provenance,
                existing_cap: self.settings.existing_question_summary_cap,
                max_chars: self.settings.max_evidence_chars,
            },
        )
        .await;
        let new_question_ids = self.db.store_questions(&proposed, project_id);

        let new_information = match &sow {
            Some(sow) => {
                proposals::detect_new_information(
                    &self.generator,
                    transcript,
                    &sow.boundaries,
                    self.settings.max_evidence_chars,
                )
                .await
            }
            None => {
                tracing::debug!(project_id, "No SOW data, skipping new information detection");
                Vec::new()
            }
        };
        let new_information_ids =
            self.db
                .store_new_information(project_id, transcript_id, &new_information);

        if !self.db.mark_transcript_processed(transcript_id) {
            tracing::warn!(transcript_id, "Transcript could not be marked processed");
        }

        tracing::info!(
            project_id,
            transcript_id,
            answers = answered.len(),
            new_questions = new_question_ids.len(),
            new_information = new_information_ids.len(),
            "Transcript reconciled"
        );

        Ok(Reconciliation::Completed(TranscriptReport {
            transcript_id,
            questions_processed: unanswered.len(),
            answers_found: answered.len(),
            answered,
            new_question_ids,
            new_information,
            new_information_ids,
        }))
    }

    /// Persist answers through `store` and advance each answered question
    fn record_answers(
        &self,
        found: Vec<FoundAnswer>,
        store: impl Fn(&FoundAnswer) -> bool,
    ) -> Vec<StoredAnswer> {
        let threshold = self.settings.answered_confidence_threshold;
        found
            .into_iter()
            .filter(|answer| store(answer))
            .map(|answer| {
                let status = QuestionStatus::from_confidence(answer.confidence, threshold);
                if !self.db.update_question_status(answer.question_id, status) {
                    tracing::warn!(question_id = answer.question_id, "Answer stored but status not updated");
                }
                StoredAnswer {
                    question_id: answer.question_id,
                    answer: answer.answer,
                    confidence: answer.confidence,
                    status,
                }
            })
            .collect()
    }

    fn load_sow(&self, project_id: i64) -> Option<SowData> {
        match self.db.get_sow_data(project_id) {
            Ok(sow) => sow,
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Failed to load SOW data");
                None
            }
        }
    }
}
