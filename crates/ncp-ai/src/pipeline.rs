//! The AI-backed steps of care plan generation.

use std::collections::BTreeMap;

use ncp_core::models::assessment::AssessmentPayload;
use ncp_core::models::care_plan::{CarePlan, CarePlanSections, Section};
use ncp_core::models::diagnosis::{DiagnosisCandidate, NnnEntry, SelectedDiagnosis};
use ncp_core::models::explanation::{Explanation, SectionExplanation};
use ncp_core::models::transaction::PipelineStep;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::AiError;
use crate::extract::parse_json_response;
use crate::generator::TextGenerator;
use crate::prompts;
use crate::transaction::{invoke, CallLog};

pub const MAX_SELECTION_ATTEMPTS: usize = 3;

pub const NO_CANDIDATES_REASONING: &str = "No suitable diagnoses found for the provided assessment data.";
pub const FALLBACK_REASONING: &str = "AI selection failed after multiple attempts. \
Returned first candidate as fallback based on highest relevance score.";

#[derive(Debug, Deserialize)]
struct SelectionReply {
    #[serde(default)]
    diagnosis: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
}

/// The candidate whose name equals `selected`, ignoring case and
/// surrounding whitespace.
pub fn match_candidate<'a>(selected: &str, candidates: &'a [DiagnosisCandidate]) -> Option<&'a DiagnosisCandidate> {
    let selected = selected.trim();
    candidates
        .iter()
        .find(|c| c.entry.diagnosis.trim().eq_ignore_ascii_case(selected))
}

/// Ask the model to choose one of `candidates`.
///
/// Up to [`MAX_SELECTION_ATTEMPTS`] attempts. A pick that is not on the list
/// tightens the prompt for the next attempt. When every attempt fails the
/// first (best-scoring) candidate is returned with `fallback` set.
pub async fn select_diagnosis(
    generator: &dyn TextGenerator,
    payload: &AssessmentPayload,
    candidates: &[DiagnosisCandidate],
    log: &mut CallLog,
) -> SelectedDiagnosis {
    let Some(first) = candidates.first() else {
        return SelectedDiagnosis::none(NO_CANDIDATES_REASONING);
    };

    let mut prompt = prompts::diagnosis_selection(payload, candidates);

    for attempt in 1..=MAX_SELECTION_ATTEMPTS {
        info!(attempt, max = MAX_SELECTION_ATTEMPTS, "AI diagnosis selection attempt");

        let context = json!({
            "attempt": attempt,
            "max_retries": MAX_SELECTION_ATTEMPTS,
            "candidates_count": candidates.len(),
            "assessment_type": payload.mode(),
        });
        let result = invoke(
            generator,
            PipelineStep::SelectDiagnosis,
            "AI Diagnosis Selection",
            prompts::SYSTEM_PROMPT,
            &prompt,
            context,
            log,
        )
        .await;

        let text = match result {
            Ok(r) => r.output,
            Err(e) => {
                warn!(attempt, error = %e, "selection call failed");
                continue;
            }
        };

        let reply: SelectionReply = match parse_json_response(&text) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(attempt, error = %e, "could not parse selection");
                continue;
            }
        };

        let selected = reply.diagnosis.unwrap_or_default();
        if let Some(candidate) = match_candidate(&selected, candidates) {
            info!(diagnosis = %candidate.entry.diagnosis, "AI selected valid diagnosis");
            return SelectedDiagnosis {
                entry: Some(candidate.entry.clone()),
                reasoning: reply.reasoning.unwrap_or_default(),
                fallback: false,
            };
        }

        warn!(attempt, selected = %selected, "AI selected a diagnosis that is not a candidate");
        if attempt < MAX_SELECTION_ATTEMPTS {
            prompt = prompts::tighten_selection(&prompt, &selected, candidates);
        }
    }

    warn!("all AI selection attempts failed, falling back to first candidate");
    SelectedDiagnosis {
        entry: Some(first.entry.clone()),
        reasoning: FALLBACK_REASONING.to_string(),
        fallback: true,
    }
}

/// Section text may come back as a string or as a list of items.
fn section_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let line = match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
                if line.starts_with("- ") { line } else { format!("- {line}") }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Write all seven care plan sections for the selected diagnosis.
pub async fn generate_care_plan(
    generator: &dyn TextGenerator,
    payload: &AssessmentPayload,
    diagnosis: &NnnEntry,
    reasoning: &str,
    log: &mut CallLog,
) -> Result<CarePlanSections, AiError> {
    let prompt = prompts::care_plan(payload, diagnosis, reasoning);
    let context = json!({
        "diagnosis": diagnosis.diagnosis,
        "format_type": payload.format_type().as_u8(),
    });
    let result = invoke(
        generator,
        PipelineStep::GenerateNcp,
        "NCP Generation",
        prompts::SYSTEM_PROMPT,
        &prompt,
        context,
        log,
    )
    .await?;

    let raw: BTreeMap<String, Value> = parse_json_response(&result.output)?;

    let mut sections = CarePlanSections::default();
    for (key, value) in &raw {
        if let Ok(section) = key.parse::<Section>() {
            sections.set(section, section_text(value));
        }
    }

    let missing = sections.missing(payload.format_type());
    if !missing.is_empty() {
        let names = missing.iter().map(|s| s.key()).collect::<Vec<_>>().join(", ");
        return Err(AiError::SchemaViolation(format!("care plan is missing sections: {names}")));
    }

    Ok(sections)
}

/// Explain each visible section of a saved plan.
pub async fn generate_explanation(
    generator: &dyn TextGenerator,
    plan: &CarePlan,
    log: &mut CallLog,
) -> Result<Explanation, AiError> {
    let prompt = prompts::explanation(plan);
    let context = json!({
        "ncp_id": plan.id,
        "format_type": plan.format_type.as_u8(),
    });
    let result = invoke(
        generator,
        PipelineStep::GenerateExplanation,
        "NCP Explanation",
        prompts::SYSTEM_PROMPT,
        &prompt,
        context,
        log,
    )
    .await?;

    let raw: BTreeMap<String, Value> = parse_json_response(&result.output)?;

    let mut sections = BTreeMap::new();
    for (key, value) in raw {
        let Ok(section) = key.parse::<Section>() else {
            continue;
        };
        if !plan.format_type.includes(section) {
            continue;
        }
        match serde_json::from_value::<SectionExplanation>(value) {
            Ok(explanation) => {
                sections.insert(section, explanation);
            }
            Err(e) => warn!(section = %section, error = %e, "skipping malformed section explanation"),
        }
    }

    if sections.is_empty() {
        return Err(AiError::SchemaViolation(
            "explanation contained no recognised sections".to_string(),
        ));
    }

    Ok(Explanation {
        ncp_id: plan.id,
        sections,
        model_id: Some(result.model_id),
        generated_at: jiff::Timestamp::now(),
    })
}
