use async_trait::async_trait;
use discovery_core::types::QuestionStatus;
use discovery_core::{
    Database, DiscoveryEngine, EngineSettings, FileExtractor, OperationStatus, TextGenerator,
};
use discovery_llm::client::LlmClient;
use discovery_llm::error::LlmError;
use discovery_llm::types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage};
use std::io::Write;
use std::sync::{Arc, Mutex};

const SOW_TEXT: &str = "Acme Customer Portal\n\
# Scope of Work\n\
The system shall be fast.\n\
# Deliverables\n\
A web portal for Acme customers.\n";

/// Answers each prompt by the first needle it contains; "[]" otherwise
struct ScenarioLlm {
    routes: Vec<(&'static str, Option<String>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScenarioLlm {
    fn new() -> Self {
        Self {
            routes: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn route(mut self, needle: &'static str, reply: &str) -> Self {
        self.routes.push((needle, Some(reply.to_string())));
        self
    }

    fn fail(mut self, needle: &'static str) -> Self {
        self.routes.push((needle, None));
        self
    }

    fn prompts_containing(&self, needle: &str) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .count()
    }
}

#[async_trait]
impl LlmClient for ScenarioLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let prompt = request
            .messages
            .iter()
            .flat_map(|m| m.content.iter())
            .map(|block| match block {
                ContentBlock::Text { text } => text.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());

        let text = match self.routes.iter().find(|(needle, _)| prompt.contains(needle)) {
            Some((_, Some(reply))) => reply.clone(),
            Some((_, None)) => return Err(LlmError::api_error(500, "scenario failure".to_string())),
            None => "[]".to_string(),
        };

        Ok(CompletionResponse {
            content: vec![ContentBlock::Text { text }],
            role: Role::Assistant,
            usage: Usage {
                input_tokens: 0,
                output_tokens: 0,
            },
            stop_reason: Some("end_turn".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        "scenario"
    }

    fn model_name(&self) -> &str {
        "scenario-model"
    }
}

fn acme_llm() -> ScenarioLlm {
    ScenarioLlm::new()
        .route(
            "Identify and extract the key sections",
            r#"```json
{"Scope of Work": "The system shall be fast.", "Deliverables": "A web portal for Acme customers."}
```"#,
        )
        .route(
            "Extract all specific requirements",
            r#"[{"id": "REQ-01", "text": "system shall be fast", "section": "Scope of Work",
                 "clarity": "ambiguous", "reason": "vague performance criteria"}]"#,
        )
        .route(
            "Analyze these SOW sections",
            r#"{"in_scope": ["web portal"], "out_of_scope": [], "unclear": []}"#,
        )
        .route(
            "Ambiguity type",
            r#"[{"question": "What page load time counts as fast?", "context": "Performance is not measurable",
                 "priority": 1, "target_stakeholder": "Product owner"}]"#,
        )
}

fn sow_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
    write!(file, "{SOW_TEXT}").unwrap();
    file
}

fn engine(llm: Arc<ScenarioLlm>) -> DiscoveryEngine {
    DiscoveryEngine::new(
        Arc::new(Database::open_in_memory().unwrap()),
        TextGenerator::new(llm),
        Arc::new(FileExtractor::new()),
        EngineSettings::default(),
    )
}

async fn start_acme(engine: &DiscoveryEngine, sow: &tempfile::NamedTempFile) -> i64 {
    let started = engine.start_discovery("Acme", sow.path(), &[]).await;
    assert_eq!(started.status, OperationStatus::Success, "{:?}", started.message);
    let started = started.data.unwrap();
    assert_eq!(started.sow_summary.requirements, 1);
    assert_eq!(started.questions_generated, 1);
    started.project_id
}

#[tokio::test]
async fn test_acme_discovery_completes_after_transcript() {
    let llm = Arc::new(
        acme_llm()
            .route(
                "question_index",
                r#"[{"question_index": 1, "answer_found": true,
                     "answer": "Every page must load within 2 seconds at 500 concurrent users",
                     "confidence": 0.9, "explanation": "Stated explicitly"}]"#,
            )
            .route(
                "Answer Received",
                r#"{"fully_answered": true, "reason": "Numeric target given", "followup_questions": []}"#,
            ),
    );
    let engine = engine(llm.clone());
    let sow = sow_file();

    let project_id = start_acme(&engine, &sow).await;
    assert_eq!(engine.find_project("Acme").unwrap().id, project_id);

    let open = engine
        .get_current_questions(project_id, Some(QuestionStatus::Unanswered))
        .await
        .data
        .unwrap();
    assert_eq!(open.count, 1);
    let question = &open.questions[0].question;
    assert_eq!(question.source, "Requirement: REQ-01");
    assert_eq!(question.source_text, "system shall be fast");
    assert_eq!(question.status, QuestionStatus::Unanswered);

    let status = engine.is_discovery_complete(project_id).await.data.unwrap();
    assert!(!status.discovery_complete);

    let processed = engine
        .process_meeting_transcript(
            project_id,
            "Acme CTO: every page must load within 2 seconds at 500 concurrent users.",
        )
        .await;
    assert_eq!(processed.status, OperationStatus::Success);
    let processed = processed.data.unwrap();
    assert_eq!(processed.reconciliation.answers_found, 1);
    assert_eq!(processed.followup_questions_count, 0);

    let answered = engine
        .get_current_questions(project_id, Some(QuestionStatus::Answered))
        .await
        .data
        .unwrap();
    assert_eq!(answered.count, 1);
    let latest = answered.questions[0].latest_answer.as_ref().unwrap();
    assert_eq!(latest.confidence, 0.9);

    let status = engine.is_discovery_complete(project_id).await.data.unwrap();
    assert!(status.discovery_complete);
    assert_eq!(status.transcript_count, 1);

    let report = engine.generate_discovery_report(project_id).await.data.unwrap();
    assert_eq!(report.questions.by_status["answered"].len(), 1);
    assert_eq!(report.transcripts.len(), 1);
    assert!(report.transcripts[0].processed);
    assert_eq!(llm.prompts_containing("Answer Received"), 1);
}

#[tokio::test]
async fn test_threshold_answer_stays_partial_when_judgement_fails() {
    let llm = Arc::new(
        acme_llm()
            .route(
                "question_index",
                r#"[{"question_index": 1, "answer_found": true, "answer": "Reasonably quick", "confidence": 0.8}]"#,
            )
            .fail("Answer Received"),
    );
    let engine = engine(llm);
    let sow = sow_file();
    let project_id = start_acme(&engine, &sow).await;

    let processed = engine
        .process_meeting_transcript(project_id, "It should be reasonably quick.")
        .await;
    assert_eq!(processed.status, OperationStatus::Success);

    let status = engine.is_discovery_complete(project_id).await.data.unwrap();
    assert_eq!(status.count("partially_answered"), 1);
    assert!(!status.discovery_complete);

    // a second transcript finds nothing left unanswered
    let again = engine
        .process_meeting_transcript(project_id, "Nothing new.")
        .await;
    assert_eq!(again.status, OperationStatus::NoQuestions);
}

#[tokio::test]
async fn test_lookup_by_name_returns_latest_project() {
    let engine = engine(Arc::new(acme_llm()));
    let sow = sow_file();
    let first = start_acme(&engine, &sow).await;
    let second = start_acme(&engine, &sow).await;

    assert_ne!(first, second);
    assert_eq!(engine.list_projects().unwrap().len(), 2);
    assert_eq!(engine.find_project("Acme").unwrap().id, second);
}
