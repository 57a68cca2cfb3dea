//! Care plan generation and validation.

use ncp_core::models::assessment::{AssessmentInput, AssessmentPayload};
use ncp_core::models::care_plan::{CarePlan, FormatType, ValidateNcpRequest};
use ncp_core::models::diagnosis::{NcpValidationResult, SelectedDiagnosis};
use serde_json::Value;
use uuid::Uuid;

use crate::client::NcpClient;
use crate::error::ClientError;

/// What `POST /generate-ncp` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// A diagnosis and a full care plan.
    Complete {
        request_id: Option<Uuid>,
        diagnosis: Option<SelectedDiagnosis>,
        plan: CarePlan,
    },
    /// Only a diagnosis (or the reason none was found). Never shown as a
    /// finished plan.
    Partial {
        request_id: Option<Uuid>,
        diagnosis: Option<SelectedDiagnosis>,
        message: Option<String>,
    },
}

impl GenerationOutcome {
    /// Classify a response body. A plan under `generatedNCP` (or `ncp`)
    /// is complete; otherwise a `diagnosis` makes it partial.
    pub fn from_response(body: Value) -> Result<Self, ClientError> {
        let request_id = body
            .get("request_id")
            .and_then(Value::as_str)
            .and_then(|id| id.parse().ok());
        let diagnosis = match body.get("diagnosis") {
            Some(Value::Null) | None => None,
            Some(value) => serde_json::from_value(value.clone()).ok(),
        };

        let plan = ["generatedNCP", "ncp"]
            .into_iter()
            .filter_map(|key| body.get(key))
            .find(|v| !v.is_null());
        if let Some(plan) = plan {
            let plan: CarePlan = serde_json::from_value(plan.clone())?;
            return Ok(GenerationOutcome::Complete {
                request_id,
                diagnosis,
                plan,
            });
        }

        if body.get("diagnosis").is_some() {
            let message = body.get("message").and_then(Value::as_str).map(str::to_string);
            return Ok(GenerationOutcome::Partial {
                request_id,
                diagnosis,
                message,
            });
        }

        Err(ClientError::Decode(
            "response contains neither a care plan nor a diagnosis".to_string(),
        ))
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, GenerationOutcome::Complete { .. })
    }

    pub fn plan(&self) -> Option<&CarePlan> {
        match self {
            GenerationOutcome::Complete { plan, .. } => Some(plan),
            GenerationOutcome::Partial { .. } => None,
        }
    }

    pub fn diagnosis(&self) -> Option<&SelectedDiagnosis> {
        match self {
            GenerationOutcome::Complete { diagnosis, .. } | GenerationOutcome::Partial { diagnosis, .. } => {
                diagnosis.as_ref()
            }
        }
    }
}

impl NcpClient {
    /// Validate the form, then generate. Invalid input never reaches the
    /// network; it fails with the per-field messages.
    pub async fn generate_from_input(
        &self,
        input: &AssessmentInput,
        format: FormatType,
    ) -> Result<GenerationOutcome, ClientError> {
        let report = input.validate();
        if !report.is_valid() {
            return Err(ClientError::Validation {
                detail: "Please fix the highlighted fields.".to_string(),
                errors: report.messages(),
            });
        }
        self.generate_ncp(&input.to_payload(format)).await
    }

    /// POST /generate-ncp
    pub async fn generate_ncp(&self, payload: &AssessmentPayload) -> Result<GenerationOutcome, ClientError> {
        let body: Value = self.post("/generate-ncp", payload).await?;
        GenerationOutcome::from_response(body)
    }

    /// POST /validate-ncp
    pub async fn validate_ncp(&self, request: &ValidateNcpRequest) -> Result<NcpValidationResult, ClientError> {
        self.post("/validate-ncp", request).await
    }
}
