use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured content extracted from a Statement of Work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SowData {
    /// Sections in document order
    pub sections: Vec<Section>,
    pub requirements: Vec<Requirement>,
    pub boundaries: ScopeBoundaries,
    /// Requirement id to supporting snippets found in supplementary documents
    #[serde(default)]
    pub requirement_matches: BTreeMap<String, Vec<RequirementMatch>>,
    pub full_text: String,
}

impl SowData {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn ambiguous_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements
            .iter()
            .filter(|r| r.clarity == Clarity::Ambiguous)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub name: String,
    pub content: String,
}

impl Section {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Requirement {
    pub id: String,
    pub text: String,
    pub section: String,
    pub clarity: Clarity,
    /// Present iff the requirement is ambiguous
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Clarity {
    Clear,
    Ambiguous,
}

impl Clarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Clarity::Clear => "clear",
            Clarity::Ambiguous => "ambiguous",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScopeBoundaries {
    #[serde(default)]
    pub in_scope: Vec<String>,
    #[serde(default)]
    pub out_of_scope: Vec<String>,
    #[serde(default)]
    pub unclear: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequirementMatch {
    pub source_file: String,
    pub keyword: String,
    pub context: String,
}
