use crate::types::{Clarity, Requirement};
use std::collections::HashSet;

const SAME_SECTION: f64 = 50.0;
const RELATED_IS_CLEAR: f64 = 25.0;
const OVERLAP_WEIGHT: f64 = 100.0;
const ADJACENT_ID: f64 = 30.0;
const ADJACENT_ID_DISTANCE: u64 = 2;

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}

/// Trailing number of an id such as "REQ-07"
fn id_number(id: &str) -> Option<u64> {
    let digits: String = id
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

pub fn relatedness(target: &Requirement, other: &Requirement) -> f64 {
    let mut score = 0.0;

    if target.section == other.section {
        score += SAME_SECTION;
    }
    if other.clarity == Clarity::Clear {
        score += RELATED_IS_CLEAR;
    }

    let target_words = words(&target.text);
    let other_words = words(&other.text);
    let union = target_words.union(&other_words).count();
    if union > 0 {
        let shared = target_words.intersection(&other_words).count();
        score += shared as f64 / union as f64 * OVERLAP_WEIGHT;
    }

    if let (Some(a), Some(b)) = (id_number(&target.id), id_number(&other.id)) {
        if a.abs_diff(b) <= ADJACENT_ID_DISTANCE {
            score += ADJACENT_ID;
        }
    }

    score
}

/// Up to `limit` other requirements with a positive score, best first
pub fn related_requirements<'a>(
    target: &Requirement,
    all: &'a [Requirement],
    limit: usize,
) -> Vec<&'a Requirement> {
    let mut scored: Vec<(f64, &Requirement)> = all
        .iter()
        .filter(|r| r.id != target.id)
        .map(|r| (relatedness(target, r), r))
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().take(limit).map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(id: &str, section: &str, text: &str, clarity: Clarity) -> Requirement {
        Requirement {
            id: id.to_string(),
            text: text.to_string(),
            section: section.to_string(),
            clarity,
            reason: None,
        }
    }

    #[test]
    fn test_score_components() {
        let target = requirement("REQ-01", "Scope", "portal login page", Clarity::Ambiguous);
        let other = requirement("REQ-03", "Scope", "portal login page", Clarity::Clear);
        // same section, clear, identical words, ids two apart
        assert_eq!(relatedness(&target, &other), 50.0 + 25.0 + 100.0 + 30.0);

        let far = requirement("REQ-09", "Pricing", "invoice schedule", Clarity::Ambiguous);
        assert_eq!(relatedness(&target, &far), 0.0);
    }

    #[test]
    fn test_related_requirements_ranked_and_capped() {
        let all = vec![
            requirement("REQ-01", "Scope", "portal login", Clarity::Ambiguous),
            requirement("REQ-02", "Scope", "portal search", Clarity::Clear),
            requirement("REQ-10", "Pricing", "invoice terms", Clarity::Ambiguous),
            requirement("REQ-11", "Scope", "reporting", Clarity::Ambiguous),
            requirement("REQ-20", "Training", "staff workshops", Clarity::Clear),
            requirement("REQ-30", "Training", "portal login training", Clarity::Clear),
        ];

        let related = related_requirements(&all[0], &all, 3);
        let ids: Vec<&str> = related.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["REQ-02", "REQ-30", "REQ-11"]);
        assert!(!ids.contains(&"REQ-10"));
    }
}
