use super::*;
use crate::extractor::FileExtractor;
use crate::test_support::RoutedLlm;
use crate::types::{Clarity, DocumentStatus, NewQuestion, Requirement, ScopeBoundaries, Section};
use std::io::Write;

const ANSWER_PROMPT: &str = "question_index";
const FOLLOWUP_PROMPT: &str = "Answer Received";

fn engine(llm: RoutedLlm) -> (DiscoveryEngine, Arc<RoutedLlm>) {
    let llm = Arc::new(llm);
    let db = Arc::new(Database::open_in_memory().unwrap());
    let engine = DiscoveryEngine::new(
        db,
        TextGenerator::new(llm.clone()),
        Arc::new(FileExtractor::new()),
        EngineSettings::default(),
    );
    (engine, llm)
}

fn acme_sow() -> SowData {
    SowData {
        sections: vec![Section::new("Scope of Work", "Build a customer portal that is fast")],
        requirements: vec![Requirement {
            id: "REQ-01".to_string(),
            text: "portal performance must be fast".to_string(),
            section: "Scope of Work".to_string(),
            clarity: Clarity::Ambiguous,
            reason: Some("vague performance criteria".to_string()),
        }],
        boundaries: ScopeBoundaries {
            in_scope: vec!["customer portal".to_string()],
            ..Default::default()
        },
        full_text: "Build a customer portal that is fast".to_string(),
        ..Default::default()
    }
}

/// Project with stored SOW data and the given open questions
fn seed(engine: &DiscoveryEngine, questions: &[&str]) -> (i64, Vec<i64>) {
    let db = engine.database();
    let project_id = db.create_project("Acme", "/tmp/acme_sow.txt").unwrap();
    assert!(db.put_sow_data(project_id, &acme_sow()));
    let new: Vec<NewQuestion> = questions
        .iter()
        .map(|q| NewQuestion::new(*q).with_source("Requirement: REQ-01", "portal performance must be fast"))
        .collect();
    let ids = db.store_questions(&new, project_id);
    (project_id, ids)
}

fn text_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[tokio::test]
async fn test_start_with_missing_sow_creates_nothing() {
    let (engine, llm) = engine(RoutedLlm::new());

    let result = engine
        .start_discovery("Acme", Path::new("/definitely/not/here.txt"), &[])
        .await;

    assert!(result.is_error());
    assert!(result.message.unwrap().contains("File not found"));
    assert!(engine.list_projects().unwrap().is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_project_is_an_error() {
    let (engine, _) = engine(RoutedLlm::new());

    let result = engine.process_meeting_transcript(99, "hello").await;
    assert_eq!(result.status, OperationStatus::Error);
    assert_eq!(result.message.as_deref(), Some("Project 99 not found"));

    assert!(engine.is_discovery_complete(99).await.is_error());
    assert!(engine.generate_discovery_report(99).await.is_error());
    assert!(engine.get_current_questions(99, None).await.is_error());
}

#[tokio::test]
async fn test_generate_questions_requires_sow_data() {
    let (engine, _) = engine(RoutedLlm::new());
    let project_id = engine
        .database()
        .create_project("Acme", "/tmp/acme_sow.txt")
        .unwrap();

    let result = engine.generate_questions(project_id).await;

    assert!(result.is_error());
    assert!(result.message.unwrap().contains("No SOW data"));
}

#[tokio::test]
async fn test_transcript_without_open_questions() {
    let (engine, llm) = engine(RoutedLlm::new());
    let (project_id, _) = seed(&engine, &[]);

    let result = engine
        .process_meeting_transcript(project_id, "General catch-up")
        .await;

    assert_eq!(result.status, OperationStatus::NoQuestions);
    assert_eq!(llm.call_count(), 0);
    assert_eq!(
        engine
            .database()
            .get_discovery_status(project_id)
            .unwrap()
            .transcript_count,
        0
    );
}

#[tokio::test]
async fn test_followup_verdict_overrides_confidence_status() {
    let (engine, llm) = engine(
        RoutedLlm::new()
            .on(
                ANSWER_PROMPT,
                r#"[{"question_index": 1, "answer_found": true, "answer": "Home page under 2 seconds", "confidence": 0.95}]"#,
            )
            .on(
                FOLLOWUP_PROMPT,
                r#"{"fully_answered": false, "reason": "Only the home page",
                    "followup_questions": [{"question": "Do search pages share the target?", "priority": 2}]}"#,
            ),
    );
    let (project_id, ids) = seed(&engine, &["What page load time is acceptable?"]);

    let result = engine
        .process_meeting_transcript(project_id, "The home page should load in under 2 seconds.")
        .await;

    assert_eq!(result.status, OperationStatus::Success);
    let summary = result.data.unwrap();
    assert_eq!(summary.reconciliation.answers_found, 1);
    // reconciliation alone would have marked it answered
    assert_eq!(summary.reconciliation.answered[0].status, QuestionStatus::Answered);
    assert_eq!(summary.followup_questions_count, 1);
    assert_eq!(llm.prompts_containing(FOLLOWUP_PROMPT).len(), 1);

    let db = engine.database();
    let parent = db.get_question(ids[0]).unwrap().unwrap();
    assert_eq!(parent.status, QuestionStatus::PartiallyAnswered);

    let child = db
        .get_question(summary.followup_question_ids[0])
        .unwrap()
        .unwrap();
    assert_eq!(child.parent_question_id, Some(ids[0]));
    assert_eq!(child.status, QuestionStatus::Unanswered);
    assert_eq!(child.source, "Requirement: REQ-01");

    assert_eq!(summary.discovery_status.total_questions, 2);
    assert!(!summary.discovery_status.discovery_complete);
}

#[tokio::test]
async fn test_additional_documents_continue_past_failures() {
    let (engine, _) = engine(RoutedLlm::new().on(
        ANSWER_PROMPT,
        r#"[{"question_index": 1, "answer_found": true, "answer": "2 seconds", "confidence": 0.5}]"#,
    ));
    let (project_id, ids) = seed(&engine, &["What page load time is acceptable?"]);
    let good = text_file("Portal performance target: 2 seconds per page.");
    let paths = vec![
        PathBuf::from("/definitely/not/here.txt"),
        good.path().to_path_buf(),
    ];

    let result = engine.process_additional_documents(project_id, &paths).await;

    assert_eq!(result.status, OperationStatus::Warning);
    assert_eq!(result.message.as_deref(), Some("1 of 2 documents failed"));
    let summary = result.data.unwrap();
    assert_eq!(summary.documents_processed, 1);
    assert_eq!(summary.documents_failed, 1);
    assert_eq!(summary.answers_found, 1);
    assert!(summary.documents[0].is_failed());
    assert_eq!(summary.documents[1].status, DocumentStatus::Completed);

    let db = engine.database();
    assert_eq!(
        db.get_question(ids[0]).unwrap().unwrap().status,
        QuestionStatus::PartiallyAnswered
    );
    // matches found in the document are persisted with the SOW data
    let sow = db.get_sow_data(project_id).unwrap().unwrap();
    assert!(sow.requirement_matches.contains_key("REQ-01"));
}

#[tokio::test]
async fn test_additional_documents_require_sow_data() {
    let (engine, _) = engine(RoutedLlm::new());
    let project_id = engine
        .database()
        .create_project("Acme", "/tmp/acme_sow.txt")
        .unwrap();
    let doc = text_file("notes");

    let result = engine
        .process_additional_documents(project_id, &[doc.path().to_path_buf()])
        .await;

    assert!(result.is_error());
    assert!(engine
        .database()
        .list_additional_documents(project_id)
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_current_questions_carry_latest_answer() {
    let (engine, _) = engine(RoutedLlm::new());
    let (project_id, ids) = seed(&engine, &["Who hosts the portal?", "Which browsers?"]);
    let db = engine.database();
    let transcript_id = db.store_transcript(project_id, "Acme IT hosts it").unwrap();
    assert!(db.store_answer(ids[0], transcript_id, "Acme IT", 0.9));
    assert!(db.update_question_status(ids[0], QuestionStatus::Answered));

    let answered = engine
        .get_current_questions(project_id, Some(QuestionStatus::Answered))
        .await
        .data
        .unwrap();
    assert_eq!(answered.count, 1);
    assert_eq!(
        answered.questions[0].latest_answer.as_ref().unwrap().answer_text,
        "Acme IT"
    );

    let all = engine.get_current_questions(project_id, None).await.data.unwrap();
    assert_eq!(all.count, 2);
    let open = all.questions.iter().find(|q| q.question.id == ids[1]).unwrap();
    assert!(open.latest_answer.is_none());
}

#[tokio::test]
async fn test_report_lists_every_status() {
    let (engine, _) = engine(RoutedLlm::new());
    let (project_id, _) = seed(&engine, &["Who hosts the portal?"]);

    let report = engine.generate_discovery_report(project_id).await.data.unwrap();

    assert_eq!(report.project.name, "Acme");
    assert_eq!(report.questions.total, 1);
    assert_eq!(report.questions.by_status.len(), 3);
    assert_eq!(report.questions.by_status["unanswered"].len(), 1);
    assert!(report.questions.by_status["answered"].is_empty());
    let summary = report.sow_summary.unwrap();
    assert_eq!(summary.requirements, 1);
    assert_eq!(summary.ambiguous_requirements, 1);
}

#[tokio::test]
async fn test_project_lookup_by_name() {
    let (engine, _) = engine(RoutedLlm::new());
    let (project_id, _) = seed(&engine, &[]);

    assert_eq!(engine.find_project("Acme").unwrap().id, project_id);
    assert!(matches!(
        engine.find_project("Globex"),
        Err(DiscoveryError::ProjectNameNotFound(_))
    ));
}

#[test]
fn test_project_locks_are_per_project() {
    let (engine, _) = engine(RoutedLlm::new());
    let a = engine.project_lock(1);
    let b = engine.project_lock(1);
    let c = engine.project_lock(2);
    assert!(Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
}

#[test]
fn test_operation_result_shape() {
    let result: OperationResult<QuestionList> = OperationResult::no_questions("nothing to do");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"status": "no_questions", "message": "nothing to do"})
    );

    let result = OperationResult::success(QuestionList {
        count: 0,
        questions: Vec::new(),
    });
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"status": "success", "count": 0, "questions": []})
    );
}
