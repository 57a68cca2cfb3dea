use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;

use ncp_core::models::assessment::AssessmentPayload;
use ncp_core::models::care_plan::ValidateNcpRequest;
use ncp_core::models::diagnosis::{GenerateNcpResponse, NcpValidationResult};

use crate::error::ApiError;
use crate::generation;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validation::validate_plan;

/// POST /generate-ncp
pub async fn generate_ncp(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AssessmentPayload>,
) -> Result<Json<GenerateNcpResponse>, ApiError> {
    if payload.is_empty() {
        let errors = BTreeMap::from([
            ("subjective".to_string(), "Subjective data is required".to_string()),
            ("objective".to_string(), "Objective data is required".to_string()),
        ]);
        return Err(ApiError::validation("Assessment data is required", errors));
    }

    let response = generation::generate(&state, &payload, user.owner()).await?;
    Ok(Json(response))
}

/// POST /validate-ncp
pub async fn validate_ncp(
    State(state): State<AppState>,
    Json(request): Json<ValidateNcpRequest>,
) -> Json<NcpValidationResult> {
    let lookup = state.lookup.read().await;
    Json(validate_plan(&request, &lookup))
}
