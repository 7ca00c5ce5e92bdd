use super::question_from_record;
use crate::generator::TextGenerator;
use crate::parser::{self, fields, Parsed};
use crate::types::NewQuestion;
use serde::Serialize;

/// Before/after counts for one refined group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementReport {
    pub source: String,
    pub before: usize,
    pub after: usize,
    /// False when the group kept its original questions
    pub refined: bool,
}

/// Questions grouped by `source`, groups in first-seen order
pub fn group_by_source(questions: Vec<NewQuestion>) -> Vec<(String, Vec<NewQuestion>)> {
    let mut groups: Vec<(String, Vec<NewQuestion>)> = Vec::new();
    for question in questions {
        match groups.iter_mut().find(|(source, _)| *source == question.source) {
            Some((_, group)) => group.push(question),
            None => groups.push((question.source.clone(), vec![question])),
        }
    }
    groups
}

/// Rewrite one group through the model.
///
/// Any failure (call error, unparseable reply, reply without usable
/// questions) returns the group unchanged.
pub async fn refine_group(
    generator: &TextGenerator,
    source: &str,
    group: Vec<NewQuestion>,
    cap: usize,
) -> (Vec<NewQuestion>, RefinementReport) {
    let before = group.len();
    let unchanged = |group: Vec<NewQuestion>| {
        let report = RefinementReport {
            source: source.to_string(),
            before,
            after: before,
            refined: false,
        };
        (group, report)
    };

    let response = match generator.generate(&refine_prompt(&group, cap)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(source, error = %e, "Refinement call failed, keeping original questions");
            return unchanged(group);
        }
    };

    let records = match parser::parse_list(&response) {
        Parsed::Empty => {
            tracing::warn!(source, "Refinement reply unparseable, keeping original questions");
            return unchanged(group);
        }
        parsed => parsed.into_inner(),
    };

    let items = origins(&group);
    let fallback_origin = items.first().copied().unwrap_or_default().to_string();
    let refined: Vec<NewQuestion> = records
        .iter()
        .filter_map(|record| {
            // keep per-item provenance when a group mixes several items
            let origin = fields::text(record, &["item"])
                .filter(|item| items.contains(&item.as_str()))
                .unwrap_or_else(|| fallback_origin.clone());
            question_from_record(record).map(|q| q.with_source(source, origin))
        })
        .take(cap)
        .collect();

    if refined.is_empty() {
        return unchanged(group);
    }

    let report = RefinementReport {
        source: source.to_string(),
        before,
        after: refined.len(),
        refined: true,
    };
    tracing::debug!(source, before, after = refined.len(), "Refined question group");
    (refined, report)
}

/// Distinct `source_text` values in first-seen order
fn origins(group: &[NewQuestion]) -> Vec<&str> {
    let mut origins: Vec<&str> = Vec::new();
    for q in group {
        if !origins.contains(&q.source_text.as_str()) {
            origins.push(&q.source_text);
        }
    }
    origins
}

fn refine_prompt(group: &[NewQuestion], cap: usize) -> String {
    let listed = group
        .iter()
        .enumerate()
        .map(|(idx, q)| {
            format!(
                "{}. {} (context: {}; priority: {})",
                idx + 1,
                q.question,
                q.context,
                q.priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let origin = origins(group)
        .iter()
        .map(|o| format!("- {o}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are reviewing clarification questions drafted for a Statement of Work.

ITEMS:
{origin}

DRAFT QUESTIONS:
{listed}

Rewrite this set into at most {cap} high-value questions:
- merge duplicates and near-duplicates
- drop questions that would not change how the work is delivered
- make every question specific and answerable by one person
- reassign priority from 1-3 (1 being highest)
- name the stakeholder best placed to answer

Do not mention internal requirement identifiers in the question text.

Format your response as a JSON array of objects with keys:
- question
- context
- priority
- target_stakeholder
- item: The item from ITEMS the question addresses, copied verbatim"#
    )
}
