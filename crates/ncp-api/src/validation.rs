//! Structural checks behind `POST /validate-ncp`.

use std::sync::LazyLock;

use regex::Regex;

use ncp_core::models::care_plan::{FormatType, Section, ValidateNcpRequest};
use ncp_core::models::diagnosis::NcpValidationResult;
use ncp_search::index::LookupIndex;
use ncp_search::query::find_by_name;

pub const VALID_FEEDBACK: &str = "NCP follows NANDA-I standards and includes every required section.";

/// Phrases that end the diagnosis label in a PES statement.
static LABEL_TERMINATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s(?:related\s+to|r/t|as\s+evidenced\s+by|aeb)\s").expect("valid terminator regex")
});

/// The NANDA-I label of a diagnosis statement: its first line, cut at the
/// "related to" clause.
pub fn diagnosis_label(diagnosis: &str) -> Option<String> {
    let line = diagnosis
        .lines()
        .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim())
        .find(|l| !l.is_empty())?;

    let end = LABEL_TERMINATOR.find(line).map_or(line.len(), |m| m.start());
    let label = &line[..end];
    Some(label.trim().trim_end_matches([',', '.', ':']).to_string())
}

/// Check that every section the format requires is filled in, and that the
/// diagnosis names an entry of the lookup table (when one is loaded).
pub fn validate_plan(request: &ValidateNcpRequest, lookup: &LookupIndex) -> NcpValidationResult {
    let format: FormatType = request.format_type;
    let mut feedback = Vec::new();
    let mut suggestions = Vec::new();

    let missing = request.sections.missing(format);
    if !missing.is_empty() {
        let names = missing.iter().map(|s| s.title()).collect::<Vec<_>>().join(", ");
        feedback.push(format!("Missing required sections: {names}"));
        suggestions.extend(missing.iter().map(|s| format!("Add content to the {} section", s.title())));
    }

    if !missing.contains(&Section::Diagnosis) && !lookup.is_empty() {
        match diagnosis_label(&request.sections.diagnosis) {
            Some(label) if find_by_name(lookup, &label).is_some() => {}
            Some(label) => {
                feedback.push(format!("Diagnosis \"{label}\" is not a recognised NANDA-I diagnosis"));
                suggestions.push("Use a diagnosis label from the NANDA-I taxonomy".to_string());
            }
            None => {}
        }
    }

    if feedback.is_empty() {
        NcpValidationResult {
            is_valid: true,
            feedback: VALID_FEEDBACK.to_string(),
            suggestions,
        }
    } else {
        NcpValidationResult {
            is_valid: false,
            feedback: feedback.join(". "),
            suggestions,
        }
    }
}
