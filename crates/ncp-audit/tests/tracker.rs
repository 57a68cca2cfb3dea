use jiff::{Timestamp, ToSpan};
use ncp_audit::tracker::{metrics, persist, started_since, RequestRecord, RequestStatus, RequestTrace, ResultSummary};
use ncp_core::models::assessment::{AssessmentInput, ManualAssessment};
use ncp_core::models::care_plan::FormatType;
use ncp_core::models::transaction::{AiCall, PipelineStep, ProviderKind};
use ncp_core::models::usage::{TokenCount, TokenUsage};

fn payload() -> ncp_core::models::assessment::AssessmentPayload {
    AssessmentInput::Manual(ManualAssessment {
        subjective: "Patient reports chest tightness\nShort of breath on exertion".to_string(),
        objective: "Respiratory rate 28 breaths per minute".to_string(),
    })
    .to_payload(FormatType::Five)
}

fn call(provider: ProviderKind, input: u64, output: u64, success: bool) -> AiCall {
    AiCall {
        timestamp: Timestamp::now(),
        step: PipelineStep::SelectDiagnosis,
        operation: "AI Diagnosis Selection".to_string(),
        provider,
        model_id: "test-model".to_string(),
        usage: TokenUsage {
            tokens: TokenCount { input, output },
            cost_usd: 0.0,
        },
        context: serde_json::json!({"attempt": 1}),
        success,
        error: None,
    }
}

fn start() -> Timestamp {
    "2025-03-15T09:30:05Z".parse().unwrap()
}

#[test]
fn summary_records_shape_not_content() {
    let trace = RequestTrace::start_at("ncp_generation", &payload(), start());
    let summary = &trace.record().assessment_summary;
    assert_eq!(summary.mode, "manual");
    assert_eq!(summary.format_type, 5);
    assert_eq!(summary.subjective_count, 2);
    assert_eq!(summary.objective_count, 1);
    assert!(summary.has_subjective && summary.has_objective);

    let json = serde_json::to_string(trace.record()).unwrap();
    assert!(!json.contains("chest tightness"));
    assert!(json.contains("\"type\":\"manual\""));
}

#[test]
fn tokens_accumulate_across_calls() {
    let mut trace = RequestTrace::start_at("ncp_generation", &payload(), start());
    trace.record_call(call(ProviderKind::Claude, 1200, 80, true));
    trace.record_calls([
        call(ProviderKind::Claude, 0, 0, false),
        call(ProviderKind::Gemini, 3000, 900, true),
    ]);

    let totals = trace.record().total_tokens;
    assert_eq!(totals.input_tokens, 4200);
    assert_eq!(totals.output_tokens, 980);
    assert_eq!(totals.total_billable, 5180);

    let by_provider = trace.record().calls_by_provider();
    assert_eq!(by_provider["claude"], 2);
    assert_eq!(by_provider["gemini"], 1);
}

#[test]
fn finish_sets_status_and_rounded_duration() {
    let mut trace = RequestTrace::start_at("ncp_generation", &payload(), start());
    trace.step_completed(PipelineStep::ParseAssessment);
    trace.step_completed(PipelineStep::FindCandidates);
    trace.record_error(PipelineStep::SelectDiagnosis, "no candidates", None);

    let end = start() + 12_346.milliseconds();
    let record = trace.finish_at(RequestStatus::Partial, ResultSummary::default(), end);

    assert_eq!(record.status, RequestStatus::Partial);
    assert_eq!(record.end_time, Some(end));
    assert_eq!(record.duration_seconds, Some(12.35));
    assert_eq!(record.errors.len(), 1);

    let line = record.summary_line();
    assert!(line.starts_with("NCP REQUEST COMPLETED - ID: "));
    assert!(line.contains("Status: partial"));
    assert!(line.contains("Steps: parse_assessment -> find_candidates"));
    assert!(line.contains("Errors: 1"));
}

#[tokio::test]
async fn persisted_file_is_named_by_time_and_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut trace = RequestTrace::start_at("ncp_generation", &payload(), start());
    trace.record_call(call(ProviderKind::Claude, 10, 5, true));
    let id = trace.id();

    let record = trace.finish_at(
        RequestStatus::Completed,
        ResultSummary {
            has_diagnosis: true,
            has_ncp: true,
            diagnosis_name: Some("Ineffective Breathing Pattern".to_string()),
            diagnosis_reasoning: Some("Tachypnea".to_string()),
            ncp_sections: vec!["assessment".to_string(), "diagnosis".to_string()],
        },
        start() + 3.seconds(),
    );

    let nested = dir.path().join("requests");
    let path = persist(&nested, &record).await.unwrap();

    let expected = format!("ncp_request_20250315_093005_{}.json", &id.simple().to_string()[..8]);
    assert_eq!(path.file_name().unwrap().to_str().unwrap(), expected);

    let saved: RequestRecord = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved, record);
    assert_eq!(saved.result_summary.unwrap().diagnosis_name.as_deref(), Some("Ineffective Breathing Pattern"));
}

#[test]
fn metrics_skip_in_flight_and_respect_the_window() {
    let day_ago = start().checked_sub(24.hours()).unwrap();
    let old = RequestTrace::start_at("generate_ncp", &payload(), day_ago.checked_sub(1.hour()).unwrap())
        .finish_at(RequestStatus::Failed, ResultSummary::default(), day_ago);
    let done = RequestTrace::start_at("generate_ncp", &payload(), start())
        .finish_at(RequestStatus::Completed, ResultSummary::default(), start().checked_add(3.seconds()).unwrap());
    let failed = RequestTrace::start_at("generate_ncp", &payload(), start())
        .finish_at(RequestStatus::Failed, ResultSummary::default(), start().checked_add(1.second()).unwrap());
    let running = RequestTrace::start_at("generate_ncp", &payload(), start()).record().clone();

    let recent = started_since(vec![old, done, failed, running], day_ago);
    assert_eq!(recent.len(), 3);

    let m = metrics(&recent);
    assert_eq!(m.total_requests, 2);
    assert_eq!(m.success_rate, 50.0);
    assert_eq!(m.avg_response_time, 2_000);
}
