use super::answers::EvidenceKind;
use crate::database::NewInformation;
use crate::generator::TextGenerator;
use crate::parser::{self, fields};
use crate::questions::question_from_record;
use crate::settings::truncate_chars;
use crate::types::{InformationImpact, NewQuestion, Question, Requirement, ScopeBoundaries};
use std::collections::HashSet;

/// Requirements quoted as context when proposing questions
const REQUIREMENT_CONTEXT_CAP: usize = 10;

/// Provenance stamped on questions proposed from one piece of evidence
#[derive(Debug, Clone)]
pub struct Provenance {
    pub source: String,
    pub source_text: String,
}

impl Provenance {
    pub fn transcript(transcript_id: i64) -> Self {
        Self {
            source: format!("Meeting Transcript: {transcript_id}"),
            source_text: "Generated from transcript analysis".to_string(),
        }
    }

    pub fn document(filename: &str) -> Self {
        Self {
            source: format!("Additional Document: {filename}"),
            source_text: "Generated from document analysis".to_string(),
        }
    }
}

/// Options for one proposal call
pub struct ProposalRequest<'a> {
    pub evidence: &'a str,
    pub kind: EvidenceKind,
    pub existing: &'a [Question],
    pub requirements: &'a [Requirement],
    pub provenance: &'a Provenance,
    pub existing_cap: usize,
    pub max_chars: usize,
}

/// Questions raised by the evidence that existing questions do not cover.
///
/// Only the first `existing_cap` existing questions are shown to the model;
/// exact duplicates of any existing question are dropped regardless.
pub async fn propose_questions(generator: &TextGenerator, request: ProposalRequest<'_>) -> Vec<NewQuestion> {
    let response = match generator.generate(&proposal_prompt(&request)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(source = %request.provenance.source, error = %e, "New question proposal failed");
            return Vec::new();
        }
    };

    let mut seen: HashSet<String> = request
        .existing
        .iter()
        .map(|q| normalize_question(&q.question))
        .collect();

    parser::parse_list(&response)
        .into_inner()
        .iter()
        .filter_map(question_from_record)
        .filter(|q| seen.insert(normalize_question(&q.question)))
        .map(|q| {
            q.with_source(
                request.provenance.source.clone(),
                request.provenance.source_text.clone(),
            )
        })
        .collect()
}

/// Lowercased alphanumeric words, for duplicate detection
fn normalize_question(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn proposal_prompt(request: &ProposalRequest<'_>) -> String {
    let existing = if request.existing.is_empty() {
        "None".to_string()
    } else {
        request
            .existing
            .iter()
            .take(request.existing_cap)
            .map(|q| format!("- {}", q.question))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let requirements = if request.requirements.is_empty() {
        "None".to_string()
    } else {
        request
            .requirements
            .iter()
            .take(REQUIREMENT_CONTEXT_CAP)
            .map(|r| format!("- {}", r.text))
            .collect::<Vec<_>>()
            .join("\n")
    };
    let (noun, label) = match request.kind {
        EvidenceKind::Transcript => ("meeting transcript", "NEW TRANSCRIPT"),
        EvidenceKind::Document => ("document", "NEW DOCUMENT CONTENT"),
    };

    format!(
        r#"You are a technical analyst reviewing a new {noun} for an ongoing project.
Generate specific questions that arise from it and are not covered by existing questions.

PROJECT REQUIREMENTS CONTEXT:
{requirements}

EXISTING QUESTIONS (avoid duplicating these):
{existing}

{label}:
{evidence}

Generate 3-7 questions that clarify technical details, dependencies, constraints,
integration points or new scope items it reveals.

Format your response as a JSON array of objects with keys:
- question: The specific question text
- context: Why this question is important
- priority: A value from 1-3 (1 being highest priority)
- target_stakeholder: Who should answer"#,
        evidence = truncate_chars(request.evidence, request.max_chars),
    )
}

/// Topics in a transcript that fall outside the recorded scope
pub async fn detect_new_information(
    generator: &TextGenerator,
    transcript: &str,
    boundaries: &ScopeBoundaries,
    max_chars: usize,
) -> Vec<NewInformation> {
    let prompt = new_information_prompt(transcript, boundaries, max_chars);
    let response = match generator.generate(&prompt).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "New information detection failed");
            return Vec::new();
        }
    };

    parser::parse_list(&response)
        .into_inner()
        .iter()
        .filter_map(|record| {
            Some(NewInformation {
                topic: fields::text(record, &["topic"])?,
                excerpt: fields::text_or(record, &["transcript_excerpt", "excerpt"], ""),
                impact: InformationImpact::normalize(&fields::text_or(record, &["impact"], "")),
                priority: fields::priority(record),
            })
        })
        .collect()
}

fn new_information_prompt(transcript: &str, boundaries: &ScopeBoundaries, max_chars: usize) -> String {
    let mut scope = String::new();
    if !boundaries.in_scope.is_empty() {
        scope.push_str("IN SCOPE:\n");
        for item in &boundaries.in_scope {
            scope.push_str(&format!("- {item}\n"));
        }
        scope.push('\n');
    }
    if !boundaries.out_of_scope.is_empty() {
        scope.push_str("OUT OF SCOPE:\n");
        for item in &boundaries.out_of_scope {
            scope.push_str(&format!("- {item}\n"));
        }
    }
    if scope.is_empty() {
        scope.push_str("Not specified");
    }

    format!(
        r#"You are analyzing a meeting transcript to identify new information that wasn't previously captured in the project's scope.

PROJECT SCOPE:
{scope}

TRANSCRIPT:
{transcript}

Identify any new information, topics, or requirements mentioned in the transcript that:
1. Are not clearly within the defined scope
2. Represent potential new requirements
3. Could modify existing requirements or scope
4. Might represent scope creep

Format your response as a JSON array of objects with these keys:
- topic: Brief description of the new information or topic
- transcript_excerpt: The relevant excerpt from the transcript
- impact: How this might impact project scope ("new_requirement", "scope_change", "clarification", "scope_creep")
- priority: A value from 1-3 (1 being highest priority) for addressing this new info"#,
        scope = scope.trim_end(),
        transcript = truncate_chars(transcript, max_chars),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_question_ignores_case_and_punctuation() {
        assert_eq!(
            normalize_question("Who hosts the  portal?"),
            normalize_question("who hosts the portal")
        );
    }

    #[test]
    fn test_scope_summary_lists_both_sides() {
        let boundaries = ScopeBoundaries {
            in_scope: vec!["web portal".to_string()],
            out_of_scope: vec!["mobile app".to_string()],
            unclear: vec!["hosting".to_string()],
        };
        let prompt = new_information_prompt("We also want a mobile app", &boundaries, 100);
        assert!(prompt.contains("IN SCOPE:\n- web portal"));
        assert!(prompt.contains("OUT OF SCOPE:\n- mobile app"));
        assert!(!prompt.contains("- hosting"));
    }

    #[test]
    fn test_empty_scope_summary() {
        let prompt = new_information_prompt("text", &ScopeBoundaries::default(), 100);
        assert!(prompt.contains("PROJECT SCOPE:\nNot specified"));
    }
}
