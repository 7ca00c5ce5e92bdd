use crate::generator::TextGenerator;
use crate::parser::{self, fields};
use crate::settings::truncate_chars;
use crate::types::Question;
use std::collections::HashSet;

/// Which kind of evidence a prompt is built over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceKind {
    Transcript,
    Document,
}

impl EvidenceKind {
    fn label(&self) -> &'static str {
        match self {
            EvidenceKind::Transcript => "TRANSCRIPT",
            EvidenceKind::Document => "DOCUMENT CONTENT",
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            EvidenceKind::Transcript => "meeting transcript",
            EvidenceKind::Document => "document",
        }
    }
}

/// An answer the model located for one question
#[derive(Debug, Clone, PartialEq)]
pub struct FoundAnswer {
    pub question_id: i64,
    pub answer: String,
    pub confidence: f64,
    pub explanation: String,
    pub document_section: Option<String>,
}

/// Ask the model which `questions` the evidence answers, one batch at a time.
///
/// A failed or unreadable batch contributes nothing; later batches still run.
pub async fn find_answers(
    generator: &TextGenerator,
    questions: &[Question],
    evidence: &str,
    kind: EvidenceKind,
    batch_size: usize,
    max_chars: usize,
) -> Vec<FoundAnswer> {
    let evidence = truncate_chars(evidence, max_chars);
    let mut found = Vec::new();

    for (batch_idx, batch) in questions.chunks(batch_size.max(1)).enumerate() {
        let response = match generator.generate(&answer_prompt(batch, evidence, kind)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(batch = batch_idx, error = %e, "Answer extraction failed for batch");
                continue;
            }
        };

        let before = found.len();
        found.extend(answers_from_response(&response, batch, kind));
        tracing::debug!(
            batch = batch_idx,
            questions = batch.len(),
            answers = found.len() - before,
            "Processed answer batch"
        );
    }

    found
}

/// Map a batch reply back onto question ids via the 1-based `question_index`
fn answers_from_response(response: &str, batch: &[Question], kind: EvidenceKind) -> Vec<FoundAnswer> {
    let mut seen = HashSet::new();

    parser::parse_list(response)
        .into_inner()
        .iter()
        .filter(|record| fields::boolean(record, "answer_found"))
        .filter_map(|record| {
            let position = fields::index(record, "question_index")?;
            let question = batch.get(position.checked_sub(1)?)?;
            let answer = fields::text(record, &["answer"])?;
            // first usable answer wins when the model repeats an index
            if !seen.insert(question.id) {
                return None;
            }
            Some(FoundAnswer {
                question_id: question.id,
                answer,
                confidence: fields::confidence(record),
                explanation: fields::text_or(record, &["explanation"], ""),
                document_section: match kind {
                    EvidenceKind::Document => fields::text(record, &["document_section"]),
                    EvidenceKind::Transcript => None,
                },
            })
        })
        .collect()
}

fn answer_prompt(batch: &[Question], evidence: &str, kind: EvidenceKind) -> String {
    let questions = batch
        .iter()
        .enumerate()
        .map(|(idx, q)| format!("{}. {}", idx + 1, q.question))
        .collect::<Vec<_>>()
        .join("\n");
    let section_key = match kind {
        EvidenceKind::Document => "\n- document_section: Which part of the document contains the answer",
        EvidenceKind::Transcript => "",
    };

    format!(
        r#"You are analyzing a {noun} to find answers to specific project discovery questions.

QUESTIONS:
{questions}

{label}:
{evidence}

For each question, determine if there is a relevant answer in the {noun}.
Format your response as a JSON array of objects with these keys:
- question_index: The number of the question (1-based)
- answer_found: Boolean indicating if an answer was found
- answer: The extracted answer (if found)
- confidence: A value from 0.0 to 1.0 indicating confidence in the answer
- explanation: Brief explanation for your confidence score{section_key}

Only extract answers that are directly stated. If you are not confident, mark confidence as low."#,
        noun = kind.noun(),
        label = kind.label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuestionStatus;

    fn question(id: i64, text: &str) -> Question {
        Question {
            id,
            project_id: 1,
            parent_question_id: None,
            question: text.to_string(),
            context: String::new(),
            source: "Requirement: REQ-01".to_string(),
            source_text: String::new(),
            priority: 1,
            target_stakeholder: None,
            status: QuestionStatus::Unanswered,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_indexes_are_one_based_and_bounded() {
        let batch = vec![question(10, "First?"), question(11, "Second?")];
        let response = r#"[
            {"question_index": 2, "answer_found": true, "answer": "Yes", "confidence": 0.9},
            {"question_index": 0, "answer_found": true, "answer": "Stray"},
            {"question_index": 3, "answer_found": true, "answer": "Out of range"},
            {"question_index": 1, "answer_found": false, "answer": "Ignored"}
        ]"#;

        let answers = answers_from_response(response, &batch, EvidenceKind::Transcript);

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].question_id, 11);
        assert_eq!(answers[0].confidence, 0.9);
        assert_eq!(answers[0].document_section, None);
    }

    #[test]
    fn test_repeated_index_keeps_first_answer() {
        let batch = vec![question(10, "First?")];
        let response = r#"[
            {"question_index": "1", "answer_found": "yes", "answer": "Two seconds", "document_section": "Appendix"},
            {"question_index": 1, "answer_found": true, "answer": "Three seconds"}
        ]"#;

        let answers = answers_from_response(response, &batch, EvidenceKind::Document);

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "Two seconds");
        assert_eq!(answers[0].document_section.as_deref(), Some("Appendix"));
    }

    #[test]
    fn test_found_without_answer_text_is_skipped() {
        let batch = vec![question(10, "First?")];
        let response = r#"[{"question_index": 1, "answer_found": true, "confidence": 0.9}]"#;
        assert!(answers_from_response(response, &batch, EvidenceKind::Transcript).is_empty());
    }

    #[test]
    fn test_empty_record_does_not_shadow_later_answer() {
        let batch = vec![question(10, "First?")];
        let response = r#"[
            {"question_index": 1, "answer_found": true, "confidence": 0.9},
            {"question_index": 1, "answer_found": true, "answer": "Two seconds", "confidence": 0.7}
        ]"#;

        let answers = answers_from_response(response, &batch, EvidenceKind::Transcript);

        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].answer, "Two seconds");
        assert_eq!(answers[0].confidence, 0.7);
    }

    #[test]
    fn test_document_prompt_asks_for_section() {
        let batch = vec![question(10, "Which browsers?")];
        let prompt = answer_prompt(&batch, "Chrome only", EvidenceKind::Document);
        assert!(prompt.contains("1. Which browsers?"));
        assert!(prompt.contains("DOCUMENT CONTENT:\nChrome only"));
        assert!(prompt.contains("document_section"));

        let prompt = answer_prompt(&batch, "Chrome only", EvidenceKind::Transcript);
        assert!(!prompt.contains("document_section"));
    }
}
