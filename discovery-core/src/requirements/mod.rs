//! Requirement extraction: SOW text to [`SowData`].
//!
//! Three model calls run in sequence (sections, requirements, boundaries).
//! Each one degrades on its own: a failed segmentation still yields one
//! synthetic section, a failed requirement call yields no requirements, and
//! a failed boundary call yields three empty lists.

pub mod boundaries;
pub mod sections;


use crate::generator::TextGenerator;
use crate::parser::{self, fields, Parsed, Record};
use crate::types::{Clarity, Requirement, ScopeBoundaries, Section, SowData};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub struct RequirementExtractor {
    generator: TextGenerator,
}

impl RequirementExtractor {
    pub fn new(generator: TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn extract(&self, document_text: &str) -> SowData {
        let sections = self.extract_sections(document_text).await;
        let requirements = self.extract_requirements(&sections).await;
        let boundaries = self.identify_boundaries(&sections).await;

        tracing::info!(
            sections = sections.len(),
            requirements = requirements.len(),
            ambiguous = requirements
                .iter()
                .filter(|r| r.clarity == Clarity::Ambiguous)
                .count(),
            unclear_boundaries = boundaries.unclear.len(),
            "Extracted SOW structure"
        );

        SowData {
            sections,
            requirements,
            boundaries,
            requirement_matches: Default::default(),
            full_text: document_text.to_string(),
        }
    }

    /// Never returns an empty list for non-empty input
    pub async fn extract_sections(&self, document_text: &str) -> Vec<Section> {
        let fallback = || vec![Section::new(sections::FULL_DOCUMENT, document_text)];

        let response = match self.generator.generate(&sections_prompt(document_text)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Section extraction call failed, using full document");
                return fallback();
            }
        };

        let parsed = match parser::parse_object(&response) {
            Parsed::Fenced(record) | Parsed::Direct(record) => {
                sections::sections_from_record(record)
            }
            _ => {
                tracing::debug!("Section response is not JSON, trying markdown headings");
                sections::markdown_sections(&response)
            }
        };

        if parsed.is_empty() {
            tracing::warn!("No sections recovered, using full document");
            return fallback();
        }
        parsed
    }

    pub async fn extract_requirements(&self, sections: &[Section]) -> Vec<Requirement> {
        let combined = sections::relevant_text(sections, sections::REQUIREMENT_KEYWORDS);
        if combined.trim().is_empty() {
            return Vec::new();
        }

        let response = match self.generator.generate(&requirements_prompt(&combined)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Requirement extraction call failed");
                return Vec::new();
            }
        };

        let records = match parser::parse_list(&response) {
            Parsed::Fenced(records) | Parsed::Direct(records) => records,
            _ => {
                let salvaged = parser::salvage_objects(&response);
                if salvaged.is_empty() {
                    requirement_lines(&response)
                } else {
                    salvaged
                }
            }
        };

        records
            .iter()
            .enumerate()
            .map(|(idx, record)| requirement_from_record(record, idx))
            .collect()
    }

    pub async fn identify_boundaries(&self, sections: &[Section]) -> ScopeBoundaries {
        let combined = sections::relevant_text(sections, sections::BOUNDARY_KEYWORDS);
        if combined.trim().is_empty() {
            return ScopeBoundaries::default();
        }

        let response = match self.generator.generate(&boundaries_prompt(&combined)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Boundary identification call failed");
                return ScopeBoundaries::default();
            }
        };

        match parser::parse_object(&response) {
            Parsed::Fenced(record) | Parsed::Direct(record) => {
                boundaries::boundaries_from_record(&record)
            }
            _ => boundaries::heuristic_boundaries(&response),
        }
    }
}

/// Fill placeholders for missing fields; unknown clarity counts as ambiguous
pub fn requirement_from_record(record: &Record, position: usize) -> Requirement {
    let id = fields::text(record, &["id", "requirement_id"])
        .unwrap_or_else(|| format!("REQ-{:02}", position + 1));
    let text = fields::text_or(record, &["text", "requirement", "description"], "Unknown text");
    let section = fields::text_or(record, &["section"], "Unknown section");

    let clarity = match fields::text(record, &["clarity"]) {
        Some(c) if c.eq_ignore_ascii_case("clear") => Clarity::Clear,
        _ => Clarity::Ambiguous,
    };
    let reason = match clarity {
        Clarity::Clear => None,
        Clarity::Ambiguous => Some(fields::text_or(record, &["reason"], "No reason provided")),
    };

    Requirement {
        id,
        text,
        section,
        clarity,
        reason,
    }
}

fn requirement_id_regex() -> &'static Regex {
    static REQ_ID: OnceLock<Regex> = OnceLock::new();
    REQ_ID.get_or_init(|| Regex::new(r"(?i)^[-*\s]*(?:id\s*:\s*)?(REQ-\d+)\b[\s:.)\-]*(.*)$").unwrap())
}

/// `REQ-nn` lines start a record; `text:`/`section:`/`clarity:`/`reason:` lines fill it
fn requirement_lines(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;

    for line in text.lines() {
        let line = line.trim();
        if let Some(caps) = requirement_id_regex().captures(line) {
            records.extend(current.take());
            let mut record = Record::new();
            record.insert("id".to_string(), Value::String(caps[1].to_uppercase()));
            let rest = caps[2].trim();
            if !rest.is_empty() {
                record.insert("text".to_string(), Value::String(rest.to_string()));
            }
            current = Some(record);
            continue;
        }

        let (Some(record), Some((key, value))) = (current.as_mut(), line.split_once(':')) else {
            continue;
        };
        let key = key.trim_start_matches(&['-', '*', ' '][..]).trim().to_lowercase();
        if matches!(key.as_str(), "text" | "section" | "clarity" | "reason") {
            record.insert(key, Value::String(value.trim().to_string()));
        }
    }
    records.extend(current);

    records
}

fn sections_prompt(document_text: &str) -> String {
    format!(
        r#"You are analyzing a Statement of Work (SOW) document.
Identify and extract the key sections from this document.
Common sections in SOW documents include:
- Introduction/Background
- Scope of Work
- Deliverables
- Timeline/Schedule
- Acceptance Criteria
- Pricing/Payment Terms
- Assumptions/Constraints
- Change Management Process

Extract each section with its heading and content.
Format your response as a JSON object with section names as keys and their content as values.

Document text:
{document_text}"#
    )
}

fn requirements_prompt(combined: &str) -> String {
    format!(
        r#"Extract all specific requirements from these SOW sections.

For each requirement:
1. Provide a short ID (e.g., REQ-01)
2. Extract the exact requirement text
3. Identify which section it comes from
4. Determine if it's clearly defined or ambiguous

A requirement should be considered ambiguous if it:
- Contains vague or subjective terms (e.g., "appropriate", "reasonable", "sufficient")
- Lacks measurable criteria or specific details
- Uses unclear terminology or jargon without definition
- Has multiple possible interpretations
- Doesn't specify who is responsible for the work
- Lacks timeline or deadline information

Format your response as a JSON array of objects with keys:
- id: A unique identifier for the requirement
- text: The exact requirement text
- section: The section it comes from
- clarity: Either "clear" or "ambiguous"
- reason: Brief explanation if marked as ambiguous

SOW Sections:
{combined}"#
    )
}

fn boundaries_prompt(combined: &str) -> String {
    format!(
        r#"Analyze these SOW sections and identify what is in-scope, out-of-scope, and areas that are unclear or not explicitly defined.

Treat as unclear any service, deliverable, responsibility or process that lacks specific detail or could be interpreted in multiple ways.

Format your response as a JSON object with three arrays:
1. "in_scope": Items explicitly included in the scope
2. "out_of_scope": Items explicitly excluded from the scope
3. "unclear": Items that should be clarified (with a brief explanation of why)

SOW Sections:
{combined}"#
    )
}
