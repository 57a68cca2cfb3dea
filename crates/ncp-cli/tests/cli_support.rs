use std::collections::BTreeMap;
use std::time::Duration;

use jiff::Timestamp;
use tempfile::TempDir;
use uuid::Uuid;

use ncp_auth::flows::{Profile, Session};
use ncp_cli::config::NcpConfig;
use ncp_cli::input::{read_assessment, resolve_format, AssessmentSource};
use ncp_cli::render;
use ncp_cli::session::{check_password, sign_up_request, stored_session};
use ncp_client::GenerationOutcome;
use ncp_core::models::assessment::AssessmentInput;
use ncp_core::models::care_plan::{CarePlan, CarePlanSections, FormatType};
use ncp_core::models::diagnosis::{NcpValidationResult, SelectedDiagnosis};
use ncp_core::progress::{OperationKind, OperationStatus, ProgressSnapshot};

fn plan(format: FormatType) -> CarePlan {
    let mut sections = CarePlanSections::default();
    sections.assessment = "- Reports pain 7/10 in the lower back".to_string();
    sections.diagnosis = "Acute Pain related to tissue injury".to_string();
    sections.outcomes = "- Pain below 3/10 within 48 hours".to_string();
    sections.evaluation = "Goal met".to_string();
    CarePlan::new("NCP: Acute Pain", format, sections)
}

#[test]
fn reads_manual_assessment_from_text_files() {
    let dir = TempDir::new().unwrap();
    let subjective = dir.path().join("subjective.txt");
    let objective = dir.path().join("objective.txt");
    std::fs::write(&subjective, "Patient reports sharp pain in the lower back\n").unwrap();
    std::fs::write(&objective, "Guarding behaviour noted on movement\n").unwrap();

    let input = read_assessment(AssessmentSource {
        json: None,
        subjective: Some(&subjective),
        objective: Some(&objective),
    })
    .unwrap();

    match input {
        AssessmentInput::Manual(m) => {
            assert!(m.subjective.starts_with("Patient reports"));
            assert!(m.objective.starts_with("Guarding"));
        }
        other => panic!("expected manual input, got {other:?}"),
    }
}

#[test]
fn reads_assistant_assessment_from_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("assessment.json");
    std::fs::write(
        &path,
        r#"{
            "mode": "assistant",
            "primary_symptoms": "Shortness of breath on exertion",
            "exam_findings": "Crackles heard in both lung bases",
            "vitals": {}
        }"#,
    )
    .unwrap();

    let input = read_assessment(AssessmentSource {
        json: Some(&path),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(input.mode_name(), "assistant");
    assert!(input.validate().is_valid());
}

#[test]
fn missing_source_is_an_error() {
    let err = read_assessment(AssessmentSource::default()).unwrap_err();
    assert!(err.to_string().contains("--subjective"));
}

#[test]
fn format_argument_beats_config() {
    let config = NcpConfig {
        default_format: 6,
        ..NcpConfig::default()
    };

    assert_eq!(resolve_format(Some(4), &config).unwrap(), FormatType::Four);
    assert_eq!(resolve_format(None, &config).unwrap(), FormatType::Six);
    assert!(resolve_format(Some(3), &config).is_err());
}

#[test]
fn progress_bar_tracks_percent() {
    let snapshot = ProgressSnapshot::new(
        Uuid::new_v4(),
        OperationKind::NcpGeneration,
        OperationStatus::Pending,
        Duration::from_secs(54),
    );

    assert_eq!(
        render::progress_line(&snapshot),
        "Generating care plan [#########-----------]  45% (0:54)"
    );
}

#[test]
fn plan_text_shows_only_visible_sections() {
    let text = render::plan_text(&plan(FormatType::Four));

    assert!(text.starts_with("NCP: Acute Pain\n"));
    assert!(text.contains("== Assessment =="));
    assert!(text.contains("== Interventions ==\n(empty)"));
    assert!(!text.contains("== Evaluation =="));
}

#[test]
fn partial_outcome_is_not_presented_as_a_plan() {
    let outcome = GenerationOutcome::Partial {
        request_id: None,
        diagnosis: Some(SelectedDiagnosis::none("No suitable diagnoses were found")),
        message: None,
    };

    let text = render::outcome_text(&outcome);

    assert!(text.starts_with("Partial result: no care plan was generated."));
    assert!(text.contains("No diagnosis could be selected."));
    assert!(text.contains("Reasoning: No suitable diagnoses were found"));
    assert!(!text.contains("=="));
}

#[test]
fn field_errors_are_listed_per_field() {
    let mut errors = BTreeMap::new();
    errors.insert("objective".to_string(), "Duplicate lines are not allowed".to_string());
    errors.insert("subjective".to_string(), "This field is required".to_string());

    assert_eq!(
        render::field_errors(&errors),
        "  objective: Duplicate lines are not allowed\n  subjective: This field is required"
    );
}

#[test]
fn validation_result_lists_suggestions() {
    let result = NcpValidationResult {
        is_valid: false,
        feedback: "Missing required sections: Outcomes".to_string(),
        suggestions: vec!["Add content to the Outcomes section".to_string()],
    };

    assert_eq!(
        render::validation_text(&result),
        "Needs work: Missing required sections: Outcomes\n  - Add content to the Outcomes section\n"
    );
}

#[test]
fn stored_session_expiry_comes_from_lifetime() {
    let now = Timestamp::from_second(1_700_000_000).unwrap();
    let issued = Session {
        access_token: "access".to_string(),
        id_token: "id".to_string(),
        refresh_token: "refresh".to_string(),
        expires_in: 3600,
    };

    let stored = stored_session("nurse@example.com", &issued, now);

    assert_eq!(stored.expires_at, Timestamp::from_second(1_700_003_600).unwrap());
    assert_eq!(stored.id_token, "id");
    assert!(!stored.is_expired(now));
}

#[test]
fn sign_up_request_trims_and_drops_blank_names() {
    let request = sign_up_request(
        "  nurse@example.com ",
        "correct-horse",
        Some(" Ada ".to_string()),
        Some("   ".to_string()),
    )
    .unwrap();

    assert_eq!(request.email, "nurse@example.com");
    assert_eq!(request.first_name.as_deref(), Some("Ada"));
    assert_eq!(request.last_name, None);
}

#[test]
fn sign_up_rejects_bad_email_and_short_password() {
    for email in ["nurse", "@example.com", "nurse@localhost"] {
        let err = sign_up_request(email, "correct-horse", None, None).unwrap_err();
        assert!(err.to_string().contains("not a valid email"), "{email}: {err}");
    }

    let err = sign_up_request("nurse@example.com", "short", None, None).unwrap_err();
    assert!(err.to_string().contains("at least 8"));
    assert!(check_password("eightchr").is_ok());
}

#[test]
fn profile_lists_name_and_custom_attributes() {
    let profile = Profile {
        username: "a1b2".to_string(),
        email: Some("nurse@example.com".to_string()),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        attributes: [
            ("email", "nurse@example.com"),
            ("custom:is_admin", "true"),
            ("custom:admin_level", "regular"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    };

    let text = render::profile_text(&profile);

    assert!(text.contains("name:  Ada Lovelace"));
    assert!(text.contains("email: nurse@example.com"));
    let level = text.find("admin_level: regular").unwrap();
    let admin = text.find("is_admin: true").unwrap();
    assert!(level < admin);
    assert!(!text.contains("custom:"));
}
