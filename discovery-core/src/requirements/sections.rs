use crate::parser::Record;
use crate::types::Section;
use serde_json::Value;

/// Name of the synthetic section used when segmentation fails
pub const FULL_DOCUMENT: &str = "Full Document";

/// Name given to text before the first markdown heading
const LEADING_SECTION: &str = "Introduction";

/// Headings longer than this are treated as body text
const MAX_HEADING_LEN: usize = 50;

/// Section names that mark requirement-bearing content
pub const REQUIREMENT_KEYWORDS: &[&str] = &[
    "scope",
    "deliverable",
    "requirement",
    "objective",
    "service",
    "feature",
    "function",
    "specification",
    "work",
    "task",
    "activity",
    "responsibility",
    "obligation",
    "timeline",
    "acceptance",
];

/// Section names that mark scope-boundary content
pub const BOUNDARY_KEYWORDS: &[&str] = &[
    "scope",
    "assumption",
    "exclusion",
    "limitation",
    "constraint",
    "boundary",
    "deliverable",
    "not included",
    "included",
    "exclude",
    "include",
    "work",
    "service",
    "responsibility",
];

/// Sections from a `{name: content}` object, keeping response order.
///
/// Non-string contents are flattened to text. Empty names are skipped.
pub fn sections_from_record(record: Record) -> Vec<Section> {
    record
        .into_iter()
        .filter(|(name, _)| !name.trim().is_empty())
        .map(|(name, value)| Section::new(name.trim(), flatten(&value)))
        .collect()
}

fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(flatten)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Split text on short `#` heading lines.
///
/// Returns nothing when the text has no heading at all.
pub fn markdown_sections(text: &str) -> Vec<Section> {
    let is_heading = |line: &str| line.starts_with('#') && line.trim().len() < MAX_HEADING_LEN;
    if !text.lines().any(is_heading) {
        return Vec::new();
    }

    let mut sections = Vec::new();
    let mut current = LEADING_SECTION.to_string();
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        if is_heading(line) {
            push_section(&mut sections, &current, &body);
            current = line.trim().trim_start_matches('#').trim().to_string();
            body.clear();
        } else {
            body.push(line);
        }
    }
    push_section(&mut sections, &current, &body);

    sections
}

fn push_section(sections: &mut Vec<Section>, name: &str, body: &[&str]) {
    let content = body.join("\n").trim().to_string();
    if !content.is_empty() {
        sections.push(Section::new(name, content));
    }
}

/// Sections whose names contain one of `keywords`, or all sections when none do,
/// rendered as `## name` blocks.
pub fn relevant_text(sections: &[Section], keywords: &[&str]) -> String {
    let matching: Vec<&Section> = sections
        .iter()
        .filter(|s| {
            let name = s.name.to_lowercase();
            keywords.iter().any(|k| name.contains(k))
        })
        .collect();

    let chosen: Vec<&Section> = if matching.is_empty() {
        sections.iter().collect()
    } else {
        matching
    };

    chosen
        .iter()
        .map(|s| format!("## {}\n{}", s.name, s.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
