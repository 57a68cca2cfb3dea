//! Assessment validation schemas.
//!
//! Every multi-line field is checked line by line against three rules, in
//! this order: line length, duplicate lines, character set. A field reports
//! only the first rule it breaks. Fields are independent of each other.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::models::assessment::{AssessmentInput, AssistantAssessment, ManualAssessment};

pub const MIN_LINE_CHARS: usize = 15;
pub const MAX_LINE_CHARS: usize = 100;

pub const LENGTH_MESSAGE: &str = "Each line must be between 15 and 100 characters";
pub const DUPLICATE_MESSAGE: &str = "Duplicate lines are not allowed";
pub const CHARSET_MESSAGE: &str =
    "Only letters, numbers, spaces and the characters . , : ( ) / % ' \" ° - are allowed";
pub const REQUIRED_MESSAGE: &str = "This field is required";

static ALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[a-zA-Z0-9\s.,:()/%'"°“”-]*$"#).expect("allowed-character pattern is valid")
});

/// The rule a field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Rule {
    Required,
    LineLength,
    DuplicateLine,
    Charset,
}

impl Rule {
    pub fn message(self) -> &'static str {
        match self {
            Rule::Required => REQUIRED_MESSAGE,
            Rule::LineLength => LENGTH_MESSAGE,
            Rule::DuplicateLine => DUPLICATE_MESSAGE,
            Rule::Charset => CHARSET_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Error)]
#[ts(export)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: String,
    pub rule: Rule,
    /// 1-based line number of the offending line, when one applies.
    pub line: Option<usize>,
    pub message: String,
}

/// Whether a field may be left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Run the three line rules over `text`. Returns the first broken rule and
/// the 1-based line it was found on.
pub fn check_lines(text: &str) -> Option<(Rule, usize)> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    if let Some((n, _)) = lines.iter().find(|(_, l)| {
        let len = l.chars().count();
        !(MIN_LINE_CHARS..=MAX_LINE_CHARS).contains(&len)
    }) {
        return Some((Rule::LineLength, *n));
    }

    let mut seen = HashSet::new();
    if let Some((n, _)) = lines.iter().find(|(_, l)| !seen.insert(*l)) {
        return Some((Rule::DuplicateLine, *n));
    }

    if let Some((n, _)) = lines.iter().find(|(_, l)| !ALLOWED_CHARS.is_match(l)) {
        return Some((Rule::Charset, *n));
    }

    None
}

/// Validate one field. Optional fields that are empty or absent skip all rules.
pub fn validate_field(field: &str, value: Option<&str>, presence: Presence) -> Option<FieldError> {
    let text = value.unwrap_or_default();

    if text.trim().is_empty() {
        return match presence {
            Presence::Optional => None,
            Presence::Required => Some(FieldError {
                field: field.to_string(),
                rule: Rule::Required,
                line: None,
                message: REQUIRED_MESSAGE.to_string(),
            }),
        };
    }

    check_lines(text).map(|(rule, line)| FieldError {
        field: field.to_string(),
        rule,
        line: Some(line),
        message: rule.message().to_string(),
    })
}

/// Outcome of validating a whole form: at most one error per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    /// `field → message`, the shape the API returns in its `errors` object.
    pub fn messages(&self) -> std::collections::BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|e| (e.field.clone(), e.message.clone()))
            .collect()
    }

    fn push(&mut self, error: Option<FieldError>) {
        if let Some(error) = error {
            self.errors.push(error);
        }
    }
}

impl ManualAssessment {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.push(validate_field("subjective", Some(&self.subjective), Presence::Required));
        report.push(validate_field("objective", Some(&self.objective), Presence::Required));
        report
    }
}

impl AssistantAssessment {
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        report.push(validate_field(
            "primary_symptoms",
            Some(&self.primary_symptoms),
            Presence::Required,
        ));
        report.push(validate_field(
            "other_symptoms",
            self.other_symptoms.as_deref(),
            Presence::Optional,
        ));
        report.push(validate_field(
            "exam_findings",
            Some(&self.exam_findings),
            Presence::Required,
        ));
        report.push(validate_field(
            "other_findings",
            self.other_findings.as_deref(),
            Presence::Optional,
        ));
        report
    }
}

impl AssessmentInput {
    pub fn validate(&self) -> ValidationReport {
        match self {
            AssessmentInput::Manual(m) => m.validate(),
            AssessmentInput::Assistant(a) => a.validate(),
        }
    }
}
