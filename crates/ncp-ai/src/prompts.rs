//! Prompt text for each generation step.

use ncp_core::models::assessment::AssessmentPayload;
use ncp_core::models::care_plan::{CarePlan, FormatType, Section};
use ncp_core::models::diagnosis::{DiagnosisCandidate, NnnEntry};

pub const SYSTEM_PROMPT: &str = "\
You are a nursing educator with deep knowledge of NANDA-I (2021-2023), NIC and NOC standards. \
You write accurate, concise clinical content for nursing students. \
When asked for JSON, return only a JSON object with no surrounding commentary.";

const CRITICAL_RULES: &str = "# CRITICAL RULES";

/// Bulleted subjective and objective data, for embedding in a prompt.
pub fn format_assessment(payload: &AssessmentPayload) -> String {
    let bullets = |section: &str| {
        let lines = payload.section_lines(section);
        if lines.is_empty() {
            "- None recorded".to_string()
        } else {
            lines.iter().map(|l| format!("- {l}")).collect::<Vec<_>>().join("\n")
        }
    };

    format!(
        "Subjective Data:\n{}\n\nObjective Data:\n{}",
        bullets("subjective"),
        bullets("objective")
    )
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}

/// Prompt asking the model to pick exactly one of `candidates`.
pub fn diagnosis_selection(payload: &AssessmentPayload, candidates: &[DiagnosisCandidate]) -> String {
    let candidate_list = candidates
        .iter()
        .map(|c| format!("- **Candidate: {}**", c.entry.diagnosis))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Your task is to select the single best nursing diagnosis for a patient, based strictly on the provided assessment data and the candidate diagnoses from the lookup table.

{CRITICAL_RULES}
- You MUST choose EXACTLY ONE diagnosis from the candidate list below
- You CANNOT invent, modify, or create any diagnosis names
- Copy the diagnosis name EXACTLY as written in the candidate list
- If multiple diagnoses seem possible, apply the prioritization rules below

# PRIORITIZATION (STRICT CLINICAL PRIORITY ORDER)
1. ABC (airway, breathing, circulation): only when the data clearly shows current compromise, not merely external support or monitoring.
2. Maslow's hierarchy: physiological, then safety, then psychosocial. A psychosocial actual problem is lower priority than a physiological or safety risk.
3. Actual problems over "risk for" problems at the same level, unless the risk is ABC-related.
4. Acute over chronic at the same level.

# Patient Assessment Data
{assessment}

# Candidate Diagnoses (CHOOSE EXACTLY ONE FROM THIS LIST)
{candidate_list}

# Return ONLY a valid JSON object with this exact structure
{{
  "diagnosis": "EXACT diagnosis name from the candidate list",
  "reasoning": "How the diagnosis matches the assessment data, why it takes priority over the others, and the specific supporting evidence"
}}"#,
        assessment = format_assessment(payload),
    )
}

/// Rewrite a selection prompt after the model picked `rejected`, which is not
/// on the list.
pub fn tighten_selection(prompt: &str, rejected: &str, candidates: &[DiagnosisCandidate]) -> String {
    let names = candidates
        .iter()
        .map(|c| format!("\"{}\"", c.entry.diagnosis))
        .collect::<Vec<_>>()
        .join(", ");
    prompt.replacen(
        CRITICAL_RULES,
        &format!(
            "{CRITICAL_RULES} - PREVIOUS ATTEMPT FAILED\nYOUR LAST SELECTION \"{rejected}\" WAS INVALID!\nYou must select from these EXACT names: {names}"
        ),
        1,
    )
}

/// Prompt for the seven care plan sections.
pub fn care_plan(payload: &AssessmentPayload, diagnosis: &NnnEntry, reasoning: &str) -> String {
    let keys = Section::ALL
        .iter()
        .map(|s| format!("  \"{}\": \"...\"", s.key()))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"Write a Nursing Care Plan for the patient below using NANDA-I, NIC and NOC standards.

{assessment}

# Selected Nursing Diagnosis
{name}
Definition: {definition}
Defining characteristics: {characteristics}
Related factors: {related}
Risk factors: {risk}
Why it was selected: {reasoning}

# Suggested NOC Outcomes
{outcomes}

# Suggested NIC Interventions
{interventions}

# Instructions
- assessment: summarise the cues that support the diagnosis
- diagnosis: the diagnosis statement ("{name} related to ... as evidenced by ...")
- outcomes: measurable, time-bound goals drawn from the suggested outcomes
- interventions: specific nursing actions drawn from the suggested interventions
- rationale: the evidence-based reason for each intervention
- implementation: how and when each intervention is carried out
- evaluation: how progress toward each outcome is judged
- Use one item per line, each starting with "- "

# Return ONLY a valid JSON object with these string fields
{{
{keys}
}}"#,
        assessment = format_assessment(payload),
        name = diagnosis.diagnosis,
        definition = diagnosis.definition.as_deref().unwrap_or("Not provided"),
        characteristics = list_or_none(&diagnosis.defining_characteristics),
        related = list_or_none(&diagnosis.related_factors),
        risk = list_or_none(&diagnosis.risk_factors),
        outcomes = list_or_none(&diagnosis.suggested_outcomes),
        interventions = list_or_none(&diagnosis.suggested_interventions),
    )
}

/// Prompt for a per-section teaching explanation of a saved plan.
pub fn explanation(plan: &CarePlan) -> String {
    let format: FormatType = plan.format_type;
    let sections = plan
        .visible_sections()
        .into_iter()
        .map(|(section, content)| format!("## {} ({})\n{}", section.title(), section.key(), content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n");
    let keys = format
        .available_sections()
        .iter()
        .map(|s| {
            format!(
                "  \"{}\": {{\"clinical_reasoning\": \"...\", \"evidence_based_support\": \"...\", \"student_guidance\": \"...\"}}",
                s.key()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"Explain the following Nursing Care Plan to a nursing student, section by section.

{sections}

For every section give:
- clinical_reasoning: why this content follows from the assessment and diagnosis
- evidence_based_support: the guidelines or evidence behind it
- student_guidance: practical advice for writing this section well

# Return ONLY a valid JSON object with this structure
{{
{keys}
}}"#
    )
}
