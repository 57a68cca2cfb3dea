use ncp_core::models::assessment::{AssessmentInput, AssistantAssessment, ManualAssessment};
use ncp_core::validation::{
    check_lines, validate_field, Presence, Rule, CHARSET_MESSAGE, DUPLICATE_MESSAGE,
    LENGTH_MESSAGE, REQUIRED_MESSAGE,
};

fn line_of(len: usize) -> String {
    "a".repeat(len)
}

#[test]
fn line_length_boundaries() {
    assert_eq!(check_lines(&line_of(14)), Some((Rule::LineLength, 1)));
    assert_eq!(check_lines(&line_of(15)), None);
    assert_eq!(check_lines(&line_of(100)), None);
    assert_eq!(check_lines(&line_of(101)), Some((Rule::LineLength, 1)));
}

#[test]
fn length_is_measured_after_trimming() {
    let padded = format!("   {}   ", line_of(14));
    assert_eq!(check_lines(&padded), Some((Rule::LineLength, 1)));
}

#[test]
fn blank_lines_are_ignored() {
    let text = "Patient reports mild nausea\n\n   \nPatient denies chest pain";
    assert_eq!(check_lines(text), None);
}

#[test]
fn duplicate_trimmed_lines_rejected() {
    let text = "Patient reports mild nausea\n  Patient reports mild nausea  ";
    assert_eq!(check_lines(text), Some((Rule::DuplicateLine, 2)));

    let err = validate_field("subjective", Some(text), Presence::Required).unwrap();
    assert_eq!(err.message, DUPLICATE_MESSAGE);
}

#[test]
fn disallowed_characters_rejected() {
    for bad in ["Contact nurse at ward@clinic", "Pain level #7 on movement"] {
        let err = validate_field("objective", Some(bad), Presence::Required).unwrap();
        assert_eq!(err.rule, Rule::Charset);
        assert_eq!(err.message, CHARSET_MESSAGE);
    }
}

#[test]
fn clinical_punctuation_allowed() {
    let text = "Temp 38.5°C, BP 120/80 (sitting)\nSpO2: 94% on room air - patient's report";
    assert_eq!(check_lines(text), None);
}

#[test]
fn length_is_checked_before_charset() {
    // Too short and contains '@': the length rule wins.
    let err = validate_field("objective", Some("a@b"), Presence::Required).unwrap();
    assert_eq!(err.rule, Rule::LineLength);
    assert_eq!(err.message, LENGTH_MESSAGE);
}

#[test]
fn offending_line_number_is_reported() {
    let text = "Patient reports mild nausea\nshort";
    let err = validate_field("subjective", Some(text), Presence::Required).unwrap();
    assert_eq!(err.line, Some(2));
}

#[test]
fn required_field_blank_is_required_error() {
    let err = validate_field("subjective", Some("   "), Presence::Required).unwrap();
    assert_eq!(err.rule, Rule::Required);
    assert_eq!(err.message, REQUIRED_MESSAGE);
}

#[test]
fn manual_reports_each_field_independently() {
    let manual = ManualAssessment {
        subjective: "too short".to_string(),
        objective: "Lungs clear on auscultation bilaterally".to_string(),
    };
    let report = manual.validate();
    assert!(!report.is_valid());
    assert_eq!(report.errors.len(), 1);
    assert!(report.error_for("subjective").is_some());
    assert!(report.error_for("objective").is_none());
}

#[test]
fn assistant_optional_fields_skip_rules_when_blank() {
    let assistant = AssistantAssessment {
        primary_symptoms: "Shortness of breath on exertion".to_string(),
        other_symptoms: Some(String::new()),
        exam_findings: "Crackles heard at both lung bases".to_string(),
        other_findings: None,
        ..Default::default()
    };
    assert!(assistant.validate().is_valid());
}

#[test]
fn assistant_optional_fields_validated_when_present() {
    let assistant = AssistantAssessment {
        primary_symptoms: "Shortness of breath on exertion".to_string(),
        other_symptoms: Some("cough".to_string()),
        exam_findings: "Crackles heard at both lung bases".to_string(),
        other_findings: Some("Skin warm #dry".to_string()),
        ..Default::default()
    };
    let report = AssessmentInput::Assistant(assistant).validate();
    let messages = report.messages();
    assert_eq!(messages.get("other_symptoms").map(String::as_str), Some(LENGTH_MESSAGE));
    assert_eq!(messages.get("other_findings").map(String::as_str), Some(LENGTH_MESSAGE));
    assert!(!messages.contains_key("primary_symptoms"));
}
