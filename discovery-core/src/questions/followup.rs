use super::question_from_record;
use crate::generator::TextGenerator;
use crate::parser::{self, fields, Parsed};
use crate::types::{NewQuestion, Question};
use serde::Serialize;
use serde_json::Value;

/// Model judgement on whether an answer resolves its question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowupVerdict {
    pub fully_answered: bool,
    pub reason: String,
    /// Children of the judged question, provenance already copied
    pub followups: Vec<NewQuestion>,
}

/// Ask whether `answer` fully resolves `question`.
///
/// Returns `None` only when the model call itself fails; an unreadable
/// reply falls back to looking for the phrase "fully answered".
pub async fn judge_answer(
    generator: &TextGenerator,
    question: &Question,
    answer: &str,
) -> Option<FollowupVerdict> {
    let response = match generator.generate(&followup_prompt(question, answer)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(question_id = question.id, error = %e, "Follow-up call failed");
            return None;
        }
    };

    let verdict = match parser::parse_object(&response) {
        Parsed::Fenced(record) | Parsed::Direct(record) => {
            let followups = match record.get("followup_questions") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => question_from_record(map),
                        Value::String(s) if !s.trim().is_empty() => {
                            Some(NewQuestion::new(s.trim()))
                        }
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            FollowupVerdict {
                fully_answered: fields::boolean(&record, "fully_answered"),
                reason: fields::text_or(&record, &["reason"], ""),
                followups,
            }
        }
        _ => {
            let lower = response.to_lowercase();
            FollowupVerdict {
                fully_answered: lower.contains("fully answered")
                    && !lower.contains("not fully answered"),
                reason: "Could not parse structured response".to_string(),
                followups: Vec::new(),
            }
        }
    };

    let followups = verdict
        .followups
        .into_iter()
        .map(|mut q| {
            q.parent_question_id = Some(question.id);
            q.with_source(question.source.clone(), question.source_text.clone())
        })
        .collect();

    Some(FollowupVerdict {
        followups,
        ..verdict
    })
}

fn followup_prompt(question: &Question, answer: &str) -> String {
    format!(
        r#"Original Question: {}
Context: {}
Source: {}
Source Text: {}

Answer Received: {answer}

Analyze if this answer fully addresses the original question. If not, or if it raises new questions:
1. Determine if any aspects of the original question remain unclear
2. Identify if the answer introduces new information that needs clarification
3. Generate follow-up questions if needed

Format your response as a JSON object with these keys:
- fully_answered: Boolean indicating if the original question is fully answered
- reason: Brief explanation for your determination
- followup_questions: Array of follow-up questions, each with:
  * question: The specific question text
  * context: Why this follow-up is needed
  * priority: A value from 1-3 (1 being highest priority)"#,
        question.question, question.context, question.source, question.source_text
    )
}
