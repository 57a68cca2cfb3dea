use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::care_plan::CarePlan;

/// One NANDA-I diagnosis row of the NNN lookup table, with its linked
/// NOC outcomes and NIC interventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NnnEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub diagnosis: String,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub defining_characteristics: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub related_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub risk_factors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggested_outcomes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggested_interventions: Vec<String>,
}

impl NnnEntry {
    /// "Risk for ..." diagnoses describe a potential rather than an actual problem.
    pub fn is_risk_diagnosis(&self) -> bool {
        self.diagnosis.trim_start().to_ascii_lowercase().starts_with("risk for")
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A candidate returned by the lookup search, with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiagnosisCandidate {
    #[serde(flatten)]
    pub entry: NnnEntry,
    pub score: f32,
}

/// The diagnosis chosen for an assessment, with the reasoning behind it.
///
/// `entry` is `None` when the lookup produced no candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectedDiagnosis {
    #[serde(default)]
    pub entry: Option<NnnEntry>,
    pub reasoning: String,
    /// True when the AI selection failed and the top candidate was used.
    #[serde(default)]
    pub fallback: bool,
}

impl SelectedDiagnosis {
    pub fn name(&self) -> Option<&str> {
        self.entry.as_ref().map(|e| e.diagnosis.as_str())
    }

    pub fn none(reasoning: impl Into<String>) -> Self {
        Self {
            entry: None,
            reasoning: reasoning.into(),
            fallback: false,
        }
    }
}

/// Overall state of a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GenerationStatus {
    /// Diagnosis and care plan both produced.
    Completed,
    /// A diagnosis (or the absence of one) was determined but no plan.
    Partial,
    Failed,
}

/// Body returned by `POST /generate-ncp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GenerateNcpResponse {
    pub request_id: Uuid,
    pub status: GenerationStatus,
    #[serde(default)]
    pub diagnosis: Option<SelectedDiagnosis>,
    #[serde(rename = "generatedNCP", default, skip_serializing_if = "Option::is_none")]
    pub generated_ncp: Option<CarePlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `POST /validate-ncp`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NcpValidationResult {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub feedback: String,
    pub suggestions: Vec<String>,
}
