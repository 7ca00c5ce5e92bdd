//! Scripted model clients shared by unit tests.

use discovery_llm::client::LlmClient;
use discovery_llm::error::LlmError;
use discovery_llm::types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn response(text: String) -> CompletionResponse {
    CompletionResponse {
        content: vec![ContentBlock::Text { text }],
        role: Role::Assistant,
        usage: Usage {
            input_tokens: 10,
            output_tokens: 20,
        },
        stop_reason: Some("end_turn".to_string()),
    }
}

fn prompt_text(request: &CompletionRequest) -> String {
    request
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .map(|block| match block {
            ContentBlock::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replies from a fixed queue in call order; "[]" once the queue runs dry
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt_text(&request));

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(response(text)),
            Some(Err(e)) => Err(e),
            None => Ok(response("[]".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

enum Reply {
    Text(String),
    Fail,
}

/// Picks a reply by the first rule whose needle occurs in the prompt.
///
/// Prompts matching no rule get "[]".
pub(crate) struct RoutedLlm {
    rules: Vec<(String, Reply)>,
    prompts: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl RoutedLlm {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules
            .push((needle.to_string(), Reply::Text(reply.to_string())));
        self
    }

    pub fn fail_on(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), Reply::Fail));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn prompts_containing(&self, needle: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains(needle))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for RoutedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let prompt = prompt_text(&request);
        self.prompts.lock().unwrap().push(prompt.clone());

        match self.rules.iter().find(|(needle, _)| prompt.contains(needle)) {
            Some((_, Reply::Text(text))) => Ok(response(text.clone())),
            Some((_, Reply::Fail)) => Err(LlmError::api_error(500, "scripted failure".to_string())),
            None => Ok(response("[]".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
