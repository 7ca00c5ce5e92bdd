//! Caller-facing workflow operations.
//!
//! Every operation returns an [`OperationResult`] instead of an error: input
//! problems (unknown project, missing SOW data, missing file) become
//! `status: error` with a message, and everything below that is recovered
//! by the stage that hit it.

pub mod report;

#[cfg(test)]
mod tests;

use crate::database::Database;
use crate::error::DiscoveryError;
use crate::extractor::DocumentExtractor;
use crate::generator::TextGenerator;
use crate::matching;
use crate::questions::{self, industry::ProjectType, refine::RefinementReport, QuestionGenerator};
use crate::reconcile::{DocumentReport, Reconciler, Reconciliation, TranscriptReport};
use crate::requirements::RequirementExtractor;
use crate::settings::EngineSettings;
use crate::types::{DiscoveryStatus, Project, QuestionStatus, QuestionWithAnswer, SowData};
use report::{DiscoveryReport, SowSummary};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Success,
    Error,
    NoQuestions,
    Warning,
}

/// Uniform result envelope: `{status, message?, ...data}`
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult<T> {
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> OperationResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: OperationStatus::Success,
            message: None,
            data: Some(data),
        }
    }

    pub fn warning(message: impl Into<String>, data: T) -> Self {
        Self {
            status: OperationStatus::Warning,
            message: Some(message.into()),
            data: Some(data),
        }
    }

    pub fn no_questions(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::NoQuestions,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn error(error: impl std::fmt::Display) -> Self {
        Self {
            status: OperationStatus::Error,
            message: Some(error.to_string()),
            data: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == OperationStatus::Error
    }

    fn from_result(operation: &str, result: Result<Self, DiscoveryError>) -> Self {
        result.unwrap_or_else(|e| {
            tracing::warn!(operation, error = %e, "Operation failed");
            Self::error(e)
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedSow {
    pub project_id: i64,
    pub sow_summary: SowSummary,
    /// Supplementary documents whose text could not be read
    pub skipped_documents: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSummary {
    pub project_id: i64,
    pub questions_generated: usize,
    pub question_ids: Vec<i64>,
    pub project_type: Option<ProjectType>,
    pub refinement: Vec<RefinementReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartSummary {
    pub project_id: i64,
    pub project_name: String,
    pub sow_summary: SowSummary,
    pub skipped_documents: Vec<String>,
    pub questions_generated: usize,
    pub project_type: Option<ProjectType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptSummary {
    #[serde(flatten)]
    pub reconciliation: TranscriptReport,
    pub followup_questions_count: usize,
    pub followup_question_ids: Vec<i64>,
    pub discovery_status: DiscoveryStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentsSummary {
    pub project_id: i64,
    pub documents_processed: usize,
    pub documents_failed: usize,
    pub answers_found: usize,
    pub new_questions_generated: usize,
    pub requirement_matches: usize,
    pub documents: Vec<DocumentReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionList {
    pub count: usize,
    pub questions: Vec<QuestionWithAnswer>,
}

pub struct DiscoveryEngine {
    db: Arc<Database>,
    generator: TextGenerator,
    extractor: Arc<dyn DocumentExtractor>,
    settings: EngineSettings,
    project_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl DiscoveryEngine {
    pub fn new(
        db: Arc<Database>,
        generator: TextGenerator,
        extractor: Arc<dyn DocumentExtractor>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            db,
            generator,
            extractor,
            settings,
            project_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Lookup by name; position in a listing is never used as identity
    pub fn find_project(&self, name: &str) -> Result<Project, DiscoveryError> {
        self.db
            .find_project_by_name(name)?
            .ok_or_else(|| DiscoveryError::ProjectNameNotFound(name.to_string()))
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, DiscoveryError> {
        Ok(self.db.list_projects()?)
    }

    /// Create a project, extract its SOW, then generate questions
    pub async fn start_discovery(
        &self,
        project_name: &str,
        sow_path: &Path,
        extra_docs: &[PathBuf],
    ) -> OperationResult<StartSummary> {
        OperationResult::from_result(
            "start_discovery",
            self.try_start(project_name, sow_path, extra_docs).await,
        )
    }

    async fn try_start(
        &self,
        project_name: &str,
        sow_path: &Path,
        extra_docs: &[PathBuf],
    ) -> Result<OperationResult<StartSummary>, DiscoveryError> {
        ensure_file(sow_path)?;
        let project_id = self
            .db
            .create_project(project_name, &sow_path.display().to_string())?;
        tracing::info!(project_id, project_name, "Started discovery");

        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let processed = self.extract_sow(project_id, sow_path, extra_docs).await?;
        let generated = self.persist_questions(project_id).await?;

        Ok(OperationResult::success(StartSummary {
            project_id,
            project_name: project_name.to_string(),
            sow_summary: processed.sow_summary,
            skipped_documents: processed.skipped_documents,
            questions_generated: generated.questions_generated,
            project_type: generated.project_type,
        }))
    }

    /// Re-extract a project's SOW; replaces the stored SOW data
    pub async fn process_documents(
        &self,
        project_id: i64,
        sow_path: &Path,
        extra_docs: &[PathBuf],
    ) -> OperationResult<ProcessedSow> {
        OperationResult::from_result(
            "process_documents",
            self.try_process_documents(project_id, sow_path, extra_docs)
                .await,
        )
    }

    async fn try_process_documents(
        &self,
        project_id: i64,
        sow_path: &Path,
        extra_docs: &[PathBuf],
    ) -> Result<OperationResult<ProcessedSow>, DiscoveryError> {
        self.require_project(project_id)?;
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;
        let processed = self.extract_sow(project_id, sow_path, extra_docs).await?;
        Ok(OperationResult::success(processed))
    }

    /// Generate and persist questions from the stored SOW data
    pub async fn generate_questions(&self, project_id: i64) -> OperationResult<GeneratedSummary> {
        OperationResult::from_result(
            "generate_questions",
            self.try_generate_questions(project_id).await,
        )
    }

    async fn try_generate_questions(
        &self,
        project_id: i64,
    ) -> Result<OperationResult<GeneratedSummary>, DiscoveryError> {
        self.require_project(project_id)?;
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;
        Ok(OperationResult::success(self.persist_questions(project_id).await?))
    }

    /// Reconcile a transcript, then judge each answer it produced.
    ///
    /// The follow-up verdict decides the final status of every question
    /// answered in this run; a failed judgement leaves the
    /// confidence-derived status in place.
    pub async fn process_meeting_transcript(
        &self,
        project_id: i64,
        transcript: &str,
    ) -> OperationResult<TranscriptSummary> {
        OperationResult::from_result(
            "process_meeting_transcript",
            self.try_process_transcript(project_id, transcript).await,
        )
    }

    async fn try_process_transcript(
        &self,
        project_id: i64,
        transcript: &str,
    ) -> Result<OperationResult<TranscriptSummary>, DiscoveryError> {
        self.require_project(project_id)?;
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let reconciliation = match self
            .reconciler()
            .reconcile_transcript(project_id, transcript)
            .await?
        {
            Reconciliation::NoQuestions => {
                return Ok(OperationResult::no_questions(
                    "No unanswered questions for this project",
                ))
            }
            Reconciliation::Completed(report) => report,
        };

        let followup_question_ids = self.follow_up(project_id, &reconciliation).await?;

        Ok(OperationResult::success(TranscriptSummary {
            followup_questions_count: followup_question_ids.len(),
            followup_question_ids,
            discovery_status: self.db.get_discovery_status(project_id)?,
            reconciliation,
        }))
    }

    async fn follow_up(
        &self,
        project_id: i64,
        reconciliation: &TranscriptReport,
    ) -> Result<Vec<i64>, DiscoveryError> {
        let mut followups = Vec::new();

        for stored in &reconciliation.answered {
            let Some(question) = self.db.get_question(stored.question_id)? else {
                continue;
            };
            let Some(verdict) =
                questions::judge_answer(&self.generator, &question, &stored.answer).await
            else {
                continue;
            };

            let status = if verdict.fully_answered {
                QuestionStatus::Answered
            } else {
                QuestionStatus::PartiallyAnswered
            };
            if status != stored.status && !self.db.update_question_status(question.id, status) {
                tracing::warn!(question_id = question.id, "Failed to apply follow-up verdict");
            }
            tracing::debug!(
                question_id = question.id,
                fully_answered = verdict.fully_answered,
                followups = verdict.followups.len(),
                "Judged answer"
            );
            followups.extend(verdict.followups);
        }

        Ok(self.db.store_questions(&followups, project_id))
    }

    /// Reconcile supplementary documents one at a time, continuing past failures
    pub async fn process_additional_documents(
        &self,
        project_id: i64,
        paths: &[PathBuf],
    ) -> OperationResult<DocumentsSummary> {
        OperationResult::from_result(
            "process_additional_documents",
            self.try_process_additional_documents(project_id, paths)
                .await,
        )
    }

    async fn try_process_additional_documents(
        &self,
        project_id: i64,
        paths: &[PathBuf],
    ) -> Result<OperationResult<DocumentsSummary>, DiscoveryError> {
        self.require_project(project_id)?;
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let mut sow = self.require_sow(project_id)?;
        if self.db.get_unanswered_questions(project_id)?.is_empty() {
            return Ok(OperationResult::no_questions(
                "No unanswered questions for this project",
            ));
        }

        let reconciler = self.reconciler();
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            documents.push(
                reconciler
                    .reconcile_document(project_id, path, &mut sow, self.extractor.as_ref())
                    .await,
            );
        }

        let summary = DocumentsSummary {
            project_id,
            documents_processed: documents.iter().filter(|d| !d.is_failed()).count(),
            documents_failed: documents.iter().filter(|d| d.is_failed()).count(),
            answers_found: documents.iter().map(|d| d.answers_found).sum(),
            new_questions_generated: documents.iter().map(|d| d.questions_generated).sum(),
            requirement_matches: documents.iter().map(|d| d.requirement_matches).sum(),
            documents,
        };

        if summary.requirement_matches > 0 && !self.db.put_sow_data(project_id, &sow) {
            tracing::warn!(project_id, "Failed to store merged requirement matches");
        }

        tracing::info!(
            project_id,
            processed = summary.documents_processed,
            failed = summary.documents_failed,
            answers = summary.answers_found,
            "Processed additional documents"
        );

        if summary.documents_failed > 0 {
            let message = format!(
                "{} of {} documents failed",
                summary.documents_failed,
                paths.len()
            );
            return Ok(OperationResult::warning(message, summary));
        }
        Ok(OperationResult::success(summary))
    }

    pub async fn get_current_questions(
        &self,
        project_id: i64,
        status: Option<QuestionStatus>,
    ) -> OperationResult<QuestionList> {
        OperationResult::from_result(
            "get_current_questions",
            self.try_current_questions(project_id, status),
        )
    }

    fn try_current_questions(
        &self,
        project_id: i64,
        status: Option<QuestionStatus>,
    ) -> Result<OperationResult<QuestionList>, DiscoveryError> {
        self.require_project(project_id)?;
        let questions = report::questions_with_answers(&self.db, project_id, status)?;
        Ok(OperationResult::success(QuestionList {
            count: questions.len(),
            questions,
        }))
    }

    /// Aggregate status; a pure read
    pub async fn is_discovery_complete(&self, project_id: i64) -> OperationResult<DiscoveryStatus> {
        let result = self
            .require_project(project_id)
            .and_then(|_| Ok(self.db.get_discovery_status(project_id)?));
        OperationResult::from_result("is_discovery_complete", result.map(OperationResult::success))
    }

    pub async fn generate_discovery_report(
        &self,
        project_id: i64,
    ) -> OperationResult<DiscoveryReport> {
        let result = self
            .require_project(project_id)
            .and_then(|project| Ok(report::build_report(&self.db, project)?));
        OperationResult::from_result(
            "generate_discovery_report",
            result.map(OperationResult::success),
        )
    }

    async fn extract_sow(
        &self,
        project_id: i64,
        sow_path: &Path,
        extra_docs: &[PathBuf],
    ) -> Result<ProcessedSow, DiscoveryError> {
        ensure_file(sow_path)?;
        let text = self.extract_text(sow_path).await?;
        let mut sow = RequirementExtractor::new(self.generator.clone())
            .extract(&text)
            .await;

        let mut skipped_documents = Vec::new();
        for path in extra_docs {
            let doc_text = match self.extract_text(path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping supplementary document");
                    skipped_documents.push(path.display().to_string());
                    continue;
                }
            };
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let matches = matching::match_requirements_to_document(
                &sow.requirements,
                &doc_text,
                &filename,
                self.settings.max_matches_per_requirement,
            );
            matching::merge_matches(
                &mut sow.requirement_matches,
                matches,
                self.settings.max_matches_per_requirement,
            );
        }

        if !self.db.put_sow_data(project_id, &sow) {
            return Err(crate::error::StorageError::OperationFailed(format!(
                "could not store SOW data for project {project_id}"
            ))
            .into());
        }

        Ok(ProcessedSow {
            project_id,
            sow_summary: SowSummary::from(&sow),
            skipped_documents,
        })
    }

    async fn persist_questions(&self, project_id: i64) -> Result<GeneratedSummary, DiscoveryError> {
        let project = self.require_project(project_id)?;
        let sow = self.require_sow(project_id)?;

        let generated = QuestionGenerator::new(self.generator.clone(), self.settings.clone())
            .generate(&project.name, &sow)
            .await;
        let question_ids = self.db.store_questions(&generated.questions, project_id);
        tracing::info!(
            project_id,
            generated = generated.questions.len(),
            stored = question_ids.len(),
            "Persisted questions"
        );

        Ok(GeneratedSummary {
            project_id,
            questions_generated: question_ids.len(),
            question_ids,
            project_type: generated.project_type,
            refinement: generated.refinement,
        })
    }

    async fn extract_text(&self, path: &Path) -> Result<String, DiscoveryError> {
        ensure_file(path)?;
        self.extractor
            .extract(path)
            .await
            .map_err(|e| DiscoveryError::Extraction {
                path: path.display().to_string(),
                message: format!("{e:#}"),
            })
    }

    fn require_project(&self, project_id: i64) -> Result<Project, DiscoveryError> {
        self.db
            .get_project(project_id)?
            .ok_or(DiscoveryError::ProjectNotFound(project_id))
    }

    fn require_sow(&self, project_id: i64) -> Result<SowData, DiscoveryError> {
        self.db
            .get_sow_data(project_id)?
            .ok_or(DiscoveryError::MissingSowData(project_id))
    }

    fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.db.clone(), self.generator.clone(), self.settings.clone())
    }

    /// One async mutex per project; runs on different projects never contend
    fn project_lock(&self, project_id: i64) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .project_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(project_id).or_default().clone()
    }
}

fn ensure_file(path: &Path) -> Result<(), DiscoveryError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DiscoveryError::FileNotFound(path.display().to_string()))
    }
}
