//! One `POST /generate-ncp` request, end to end.
//!
//! Each request owns its [`RequestTrace`]; the finished record is written to
//! the requests directory whatever the outcome.

use ncp_ai::pipeline;
use ncp_ai::transaction::CallLog;
use ncp_audit::events::{AuditAction, AuditEvent};
use ncp_audit::tracker::{self, RequestStatus, RequestTrace, ResultSummary};
use ncp_core::models::assessment::AssessmentPayload;
use ncp_core::models::care_plan::{default_title, CarePlan};
use ncp_core::models::diagnosis::{GenerateNcpResponse, GenerationStatus, SelectedDiagnosis};
use ncp_core::models::transaction::PipelineStep;
use ncp_search::keywords::assessment_keywords;
use ncp_search::query::{find_candidates, DEFAULT_CANDIDATES};
use ncp_storage::ncps;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

pub const PLAN_FAILED_MESSAGE: &str = "Diagnosis selected but care plan generation failed";

/// Run the pipeline for `payload`, saving the plan under `owner`.
pub async fn generate(state: &AppState, payload: &AssessmentPayload, owner: Option<&str>) -> Result<GenerateNcpResponse, ApiError> {
    let mut trace = RequestTrace::start("ncp_generation", payload);
    info!(request_id = %trace.id(), mode = payload.mode(), format = %payload.format_type(), "generation started");

    let result = run(state, payload, owner, &mut trace).await;

    let (status, summary) = match &result {
        Ok(response) => (tracker_status(response.status), summary_of(response)),
        Err(e) => {
            trace.record_error(PipelineStep::GenerateNcp, format!("{e:?}"), None);
            (RequestStatus::Failed, ResultSummary::default())
        }
    };
    let record = trace.finish(status, summary);
    if let Err(e) = tracker::persist(&state.requests_dir, &record).await {
        warn!(error = %e, "failed to persist request record");
    }

    let mut response = result?;
    response.request_id = record.request_id;
    Ok(response)
}

async fn run(
    state: &AppState,
    payload: &AssessmentPayload,
    owner: Option<&str>,
    trace: &mut RequestTrace,
) -> Result<GenerateNcpResponse, ApiError> {
    let keywords = assessment_keywords(payload);
    trace.step_completed(PipelineStep::ParseAssessment);

    let candidates = {
        let lookup = state.lookup.read().await;
        find_candidates(&lookup, &keywords, DEFAULT_CANDIDATES)?
    };
    info!(count = candidates.len(), "candidate diagnoses found");
    trace.step_completed(PipelineStep::FindCandidates);

    let generator = state.providers.active().await?;

    let mut log = CallLog::default();
    let selected = pipeline::select_diagnosis(generator.as_ref(), payload, &candidates, &mut log).await;
    trace.record_calls(std::mem::take(&mut log.calls));
    trace.step_completed(PipelineStep::SelectDiagnosis);

    let Some(entry) = selected.entry.clone() else {
        return Ok(partial(trace, selected, None));
    };

    let sections =
        match pipeline::generate_care_plan(generator.as_ref(), payload, &entry, &selected.reasoning, &mut log).await {
            Ok(sections) => sections,
            Err(e) => {
                trace.record_calls(std::mem::take(&mut log.calls));
                trace.record_error(
                    PipelineStep::GenerateNcp,
                    e.to_string(),
                    Some(json!({ "diagnosis": entry.diagnosis })),
                );
                return Ok(partial(trace, selected, Some(PLAN_FAILED_MESSAGE.to_string())));
            }
        };
    trace.record_calls(std::mem::take(&mut log.calls));
    trace.step_completed(PipelineStep::GenerateNcp);

    let mut plan = CarePlan::new(default_title(Some(&entry.diagnosis)), payload.format_type(), sections);
    plan.user_id = owner.map(str::to_string);
    ncps::save_ncp(&state.store, &plan).await?;

    AuditEvent::new(AuditAction::GenerateNcp, plan.id.to_string(), owner.unwrap_or("anonymous"))
        .with_details(json!({
            "request_id": trace.id(),
            "diagnosis": entry.diagnosis,
            "fallback": selected.fallback,
        }))
        .emit();

    Ok(GenerateNcpResponse {
        request_id: trace.id(),
        status: GenerationStatus::Completed,
        diagnosis: Some(selected),
        generated_ncp: Some(plan),
        message: None,
    })
}

fn partial(trace: &RequestTrace, selected: SelectedDiagnosis, message: Option<String>) -> GenerateNcpResponse {
    let message = message.or_else(|| Some(selected.reasoning.clone()).filter(|r| !r.is_empty()));
    GenerateNcpResponse {
        request_id: trace.id(),
        status: GenerationStatus::Partial,
        diagnosis: Some(selected),
        generated_ncp: None,
        message,
    }
}

fn tracker_status(status: GenerationStatus) -> RequestStatus {
    match status {
        GenerationStatus::Completed => RequestStatus::Completed,
        GenerationStatus::Partial => RequestStatus::Partial,
        GenerationStatus::Failed => RequestStatus::Failed,
    }
}

fn summary_of(response: &GenerateNcpResponse) -> ResultSummary {
    let diagnosis = response.diagnosis.as_ref();
    ResultSummary {
        has_diagnosis: diagnosis.and_then(SelectedDiagnosis::name).is_some(),
        has_ncp: response.generated_ncp.is_some(),
        diagnosis_name: diagnosis.and_then(SelectedDiagnosis::name).map(str::to_string),
        diagnosis_reasoning: diagnosis.map(|d| d.reasoning.clone()),
        ncp_sections: response
            .generated_ncp
            .as_ref()
            .map(|plan| {
                plan.visible_sections()
                    .into_iter()
                    .map(|(section, _)| section.key().to_string())
                    .collect()
            })
            .unwrap_or_default(),
    }
}
