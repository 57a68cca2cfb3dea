//! Keyword text for the lookup query.

use std::collections::HashSet;

use ncp_core::models::assessment::AssessmentPayload;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "he", "her",
    "his", "in", "is", "it", "of", "on", "or", "she", "that", "the", "their", "they", "this",
    "to", "was", "were", "with", "patient", "pt", "client", "reports", "states", "per",
];

/// Reduce an assessment to distinct lowercase terms, stopwords and numbers
/// removed, in first-seen order.
pub fn assessment_keywords(payload: &AssessmentPayload) -> String {
    let lines = payload
        .section_lines("subjective")
        .into_iter()
        .chain(payload.section_lines("objective"));

    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for line in lines {
        for word in line
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| w.len() > 2 && !w.chars().all(|c| c.is_ascii_digit()))
            .filter(|w| !STOPWORDS.contains(&w.as_str()))
        {
            if seen.insert(word.clone()) {
                terms.push(word);
            }
        }
    }
    terms.join(" ")
}
