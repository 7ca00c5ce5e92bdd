use crate::database::Database;
use crate::error::StorageError;
use crate::types::{
    AdditionalDocument, DiscoveryStatus, NewInformationItem, Project, QuestionStatus,
    QuestionWithAnswer, SowData,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts describing one extracted SOW
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SowSummary {
    pub sections: usize,
    pub requirements: usize,
    pub ambiguous_requirements: usize,
    pub in_scope: usize,
    pub out_of_scope: usize,
    pub unclear: usize,
    pub requirement_matches: usize,
}

impl From<&SowData> for SowSummary {
    fn from(sow: &SowData) -> Self {
        Self {
            sections: sow.sections.len(),
            requirements: sow.requirements.len(),
            ambiguous_requirements: sow.ambiguous_requirements().count(),
            in_scope: sow.boundaries.in_scope.len(),
            out_of_scope: sow.boundaries.out_of_scope.len(),
            unclear: sow.boundaries.unclear.len(),
            requirement_matches: crate::matching::count_matches(&sow.requirement_matches),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportProject {
    pub id: i64,
    pub name: String,
    pub sow_path: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportQuestions {
    pub total: usize,
    /// Every status is present, possibly empty
    pub by_status: BTreeMap<String, Vec<QuestionWithAnswer>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTranscript {
    pub id: i64,
    pub meeting_date: i64,
    pub processed: bool,
    pub characters: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub project: ReportProject,
    pub generated_at: i64,
    pub discovery_status: DiscoveryStatus,
    pub sow_summary: Option<SowSummary>,
    pub questions: ReportQuestions,
    pub transcripts: Vec<ReportTranscript>,
    pub additional_documents: Vec<AdditionalDocument>,
    pub new_information: Vec<NewInformationItem>,
}

/// Questions with their latest answer attached where one exists
pub(crate) fn questions_with_answers(
    db: &Database,
    project_id: i64,
    status: Option<QuestionStatus>,
) -> Result<Vec<QuestionWithAnswer>, StorageError> {
    db.get_questions(project_id, status)?
        .into_iter()
        .map(|question| {
            let latest_answer = match question.status {
                QuestionStatus::Unanswered => None,
                _ => db.latest_answer(question.id)?,
            };
            Ok(QuestionWithAnswer {
                question,
                latest_answer,
            })
        })
        .collect()
}

/// Read-only snapshot of everything recorded for a project
pub(crate) fn build_report(db: &Database, project: Project) -> Result<DiscoveryReport, StorageError> {
    let project_id = project.id;

    let mut by_status: BTreeMap<String, Vec<QuestionWithAnswer>> = QuestionStatus::ALL
        .iter()
        .map(|s| (s.as_str().to_string(), Vec::new()))
        .collect();
    let questions = questions_with_answers(db, project_id, None)?;
    let total = questions.len();
    for entry in questions {
        by_status
            .entry(entry.question.status.as_str().to_string())
            .or_default()
            .push(entry);
    }

    let transcripts = db
        .list_transcripts(project_id)?
        .into_iter()
        .map(|t| ReportTranscript {
            id: t.id,
            meeting_date: t.meeting_date,
            processed: t.processed,
            characters: t.transcript_text.chars().count(),
        })
        .collect();

    Ok(DiscoveryReport {
        discovery_status: db.get_discovery_status(project_id)?,
        sow_summary: db.get_sow_data(project_id)?.as_ref().map(SowSummary::from),
        questions: ReportQuestions { total, by_status },
        transcripts,
        additional_documents: db.list_additional_documents(project_id)?,
        new_information: db.list_new_information(project_id)?,
        generated_at: chrono::Utc::now().timestamp(),
        project: ReportProject {
            id: project.id,
            name: project.name,
            sow_path: project.sow_path,
            created_at: project.created_at,
        },
    })
}
