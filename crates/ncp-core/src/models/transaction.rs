use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

use super::usage::TokenUsage;

/// Which AI backend served a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ProviderKind {
    Claude,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Claude, ProviderKind::Gemini];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" => Ok(ProviderKind::Claude),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(format!("Invalid provider: {other}. Must be 'claude' or 'gemini'")),
        }
    }
}

/// The steps of the generation pipeline. Each AI call is tagged with one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PipelineStep {
    ParseAssessment,
    FindCandidates,
    SelectDiagnosis,
    GenerateNcp,
    GenerateExplanation,
}

impl PipelineStep {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStep::ParseAssessment => "parse_assessment",
            PipelineStep::FindCandidates => "find_candidates",
            PipelineStep::SelectDiagnosis => "select_diagnosis",
            PipelineStep::GenerateNcp => "generate_ncp",
            PipelineStep::GenerateExplanation => "generate_explanation",
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineStep {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            PipelineStep::ParseAssessment,
            PipelineStep::FindCandidates,
            PipelineStep::SelectDiagnosis,
            PipelineStep::GenerateNcp,
            PipelineStep::GenerateExplanation,
        ]
        .into_iter()
        .find(|step| step.as_str() == s)
        .ok_or_else(|| CoreError::MissingField(format!("pipeline step {s}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionStatus {
    Pending,
    Complete,
    Failed,
}

/// One AI call made while serving a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AiCall {
    pub timestamp: jiff::Timestamp,
    pub step: PipelineStep,
    /// Human-readable description, e.g. `AI Diagnosis Selection`.
    pub operation: String,
    pub provider: ProviderKind,
    pub model_id: String,
    pub usage: TokenUsage,
    /// Step-specific details such as the attempt number.
    #[serde(default)]
    pub context: serde_json::Value,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
