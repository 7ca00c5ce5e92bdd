//! Keyword matching between requirements and supplementary documents.

use crate::types::{Requirement, RequirementMatch};
use regex::RegexBuilder;
use std::collections::BTreeMap;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by", "shall",
    "will", "should", "must",
];

const TRIM_CHARS: &[char] = &[',', '.', '(', ')', '[', ']', '{', '}', ':', ';', '\'', '"'];

/// Characters of context kept on each side of a keyword hit
const CONTEXT_CHARS: usize = 100;

/// Keywords shorter than this are skipped when matching
const MIN_KEYWORD_LEN: usize = 4;

/// Single words longer than three characters plus every two- and
/// three-word phrase, deduplicated in first-seen order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let mut keywords: Vec<String> = Vec::new();

    let mut push = |candidate: String| {
        if !candidate.is_empty() && !keywords.contains(&candidate) {
            keywords.push(candidate);
        }
    };

    for word in &words {
        if STOP_WORDS.contains(word) || word.chars().count() <= 3 {
            continue;
        }
        push(word.trim_matches(TRIM_CHARS).to_string());
    }
    for pair in words.windows(2) {
        push(pair.join(" ").trim_matches(TRIM_CHARS).to_string());
    }
    for triple in words.windows(3) {
        push(triple.join(" ").trim_matches(TRIM_CHARS).to_string());
    }

    keywords
}

/// Context snippets in `document` for each requirement's keywords.
///
/// Requirements without hits are absent from the result. At most
/// `max_per_requirement` snippets are kept per requirement.
pub fn match_requirements_to_document(
    requirements: &[Requirement],
    document: &str,
    source_file: &str,
    max_per_requirement: usize,
) -> BTreeMap<String, Vec<RequirementMatch>> {
    let mut result = BTreeMap::new();

    for requirement in requirements {
        if requirement.text.trim().is_empty() {
            continue;
        }

        let mut matches = Vec::new();
        'keywords: for keyword in extract_keywords(&requirement.text) {
            if keyword.chars().count() < MIN_KEYWORD_LEN {
                continue;
            }

            let pattern = format!(
                r"(.{{0,{n}}}{kw}.{{0,{n}}})",
                n = CONTEXT_CHARS,
                kw = regex::escape(&keyword)
            );
            let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(regex) => regex,
                Err(e) => {
                    tracing::debug!(keyword = %keyword, error = %e, "Skipping keyword");
                    continue;
                }
            };

            for hit in regex.find_iter(document) {
                let context = hit.as_str().trim();
                if context.is_empty() {
                    continue;
                }
                matches.push(RequirementMatch {
                    source_file: source_file.to_string(),
                    keyword: keyword.clone(),
                    context: context.to_string(),
                });
                if matches.len() >= max_per_requirement {
                    break 'keywords;
                }
            }
        }

        if !matches.is_empty() {
            result.insert(requirement.id.clone(), matches);
        }
    }

    result
}

/// Append `incoming` into `existing`, keeping the per-requirement cap
pub fn merge_matches(
    existing: &mut BTreeMap<String, Vec<RequirementMatch>>,
    incoming: BTreeMap<String, Vec<RequirementMatch>>,
    max_per_requirement: usize,
) {
    for (requirement_id, matches) in incoming {
        let entry = existing.entry(requirement_id).or_default();
        let room = max_per_requirement.saturating_sub(entry.len());
        entry.extend(matches.into_iter().take(room));
    }
}

/// Total snippet count across requirements
pub fn count_matches(matches: &BTreeMap<String, Vec<RequirementMatch>>) -> usize {
    matches.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Clarity;

    fn requirement(id: &str, text: &str) -> Requirement {
        Requirement {
            id: id.to_string(),
            text: text.to_string(),
            section: "Scope of Work".to_string(),
            clarity: Clarity::Clear,
            reason: None,
        }
    }

    #[test]
    fn test_extract_keywords_drops_stop_words_and_short_words() {
        let keywords = extract_keywords("The vendor shall migrate customer data.");
        assert!(keywords.contains(&"vendor".to_string()));
        assert!(keywords.contains(&"migrate".to_string()));
        assert!(keywords.contains(&"data".to_string()));
        assert!(keywords.contains(&"customer data".to_string()));
        assert!(keywords.contains(&"migrate customer data".to_string()));
        assert!(!keywords.contains(&"shall".to_string()));
        assert!(!keywords.contains(&"the".to_string()));
    }

    #[test]
    fn test_extract_keywords_deduplicates() {
        let keywords = extract_keywords("report report report");
        assert_eq!(keywords.iter().filter(|k| *k == "report").count(), 1);
    }

    #[test]
    fn test_match_finds_context_case_insensitively() {
        let doc = "Meeting notes.\nThe PORTAL must support single sign-on for all staff.\nOther topics.";
        let matches =
            match_requirements_to_document(&[requirement("REQ-01", "Build a portal")], doc, "notes.txt", 20);

        let hits = &matches["REQ-01"];
        assert!(hits.iter().any(|m| m.keyword == "portal"));
        assert!(hits[0].context.contains("single sign-on"));
        assert_eq!(hits[0].source_file, "notes.txt");
    }

    #[test]
    fn test_match_respects_cap_and_skips_misses() {
        let doc = "portal ".repeat(100);
        let matches = match_requirements_to_document(
            &[
                requirement("REQ-01", "portal"),
                requirement("REQ-02", "blockchain ledger"),
            ],
            &doc,
            "doc.txt",
            3,
        );
        assert_eq!(matches["REQ-01"].len(), 3);
        assert!(!matches.contains_key("REQ-02"));
    }

    #[test]
    fn test_merge_matches_keeps_cap() {
        let mut existing = match_requirements_to_document(
            &[requirement("REQ-01", "portal")],
            "portal\nportal",
            "a.txt",
            20,
        );
        let incoming = match_requirements_to_document(
            &[requirement("REQ-01", "portal")],
            "portal\nportal\nportal",
            "b.txt",
            20,
        );
        merge_matches(&mut existing, incoming, 4);
        assert_eq!(existing["REQ-01"].len(), 4);
        assert_eq!(count_matches(&existing), 4);
    }
}
