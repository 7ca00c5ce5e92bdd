//! Deterministic ambiguity categorisation and prioritisation.

use crate::types::{Clarity, Requirement};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Clear,
    VagueLanguage,
    MissingCriteria,
    UndefinedTerms,
    ScopeIssues,
    FormatMissing,
    Other,
}

/// Checked in order; the first bucket with a matching pattern wins
const PATTERNS: &[(Category, &[&str])] = &[
    (
        Category::MissingCriteria,
        &[
            "metric",
            "measurable",
            "measure",
            "criteria",
            "criterion",
            "quantif",
            "threshold",
            "benchmark",
            "kpi",
            "specific detail",
        ],
    ),
    (
        Category::VagueLanguage,
        &[
            "vague",
            "subjective",
            "appropriate",
            "reasonable",
            "sufficient",
            "adequate",
            "general",
            "imprecise",
        ],
    ),
    (
        Category::UndefinedTerms,
        &[
            "undefined",
            "not defined",
            "definition",
            "terminology",
            "jargon",
            "acronym",
            "unclear term",
        ],
    ),
    (
        Category::ScopeIssues,
        &[
            "scope",
            "responsib",
            "boundar",
            "ownership",
            "who will",
            "interpretation",
            "extent",
        ],
    ),
    (
        Category::FormatMissing,
        &["format", "template", "structure", "medium", "layout"],
    ),
];

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clear => "clear",
            Category::VagueLanguage => "vague_language",
            Category::MissingCriteria => "missing_criteria",
            Category::UndefinedTerms => "undefined_terms",
            Category::ScopeIssues => "scope_issues",
            Category::FormatMissing => "format_missing",
            Category::Other => "other",
        }
    }

    /// Priority before section adjustment; 1 is highest
    pub fn base_priority(&self) -> u8 {
        match self {
            Category::MissingCriteria | Category::ScopeIssues => 1,
            Category::VagueLanguage | Category::UndefinedTerms => 2,
            Category::FormatMissing | Category::Other | Category::Clear => 3,
        }
    }
}

/// Bucket for a requirement, from its ambiguity reason
pub fn categorize(requirement: &Requirement) -> Category {
    if requirement.clarity == Clarity::Clear {
        return Category::Clear;
    }
    let reason = requirement
        .reason
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| reason.contains(p)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

const HIGH_PRIORITY_SECTIONS: &[&str] = &["scope", "deliverable", "acceptance"];
const MEDIUM_PRIORITY_SECTIONS: &[&str] = &["timeline", "schedule", "assumption"];

/// Base priority moved one step by section importance, kept within 1..=3
pub fn priority_for(category: Category, section: &str) -> u8 {
    let base = category.base_priority();
    let section = section.to_lowercase();

    if HIGH_PRIORITY_SECTIONS.iter().any(|s| section.contains(s)) {
        base.saturating_sub(1).max(1)
    } else if MEDIUM_PRIORITY_SECTIONS.iter().any(|s| section.contains(s)) {
        (base + 1).min(3)
    } else {
        base
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedRequirement<'a> {
    pub requirement: &'a Requirement,
    pub category: Category,
    pub priority: u8,
}

/// Ambiguous requirements by ascending priority, then clear ones in input order.
///
/// Ties keep input order.
pub fn rank_requirements(requirements: &[Requirement]) -> Vec<RankedRequirement<'_>> {
    let (mut ambiguous, clear): (Vec<_>, Vec<_>) = requirements
        .iter()
        .map(|requirement| {
            let category = categorize(requirement);
            RankedRequirement {
                requirement,
                category,
                priority: priority_for(category, &requirement.section),
            }
        })
        .partition(|r| r.category != Category::Clear);

    ambiguous.sort_by_key(|r| r.priority);
    ambiguous.extend(clear);
    ambiguous
}
