use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use ncp_ai::pipeline;
use ncp_ai::transaction::CallLog;
use ncp_audit::events::{AuditAction, AuditEvent};
use ncp_core::models::explanation::Explanation;
use ncp_storage::ncps;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::routes::ncps::load_owned;
use crate::state::AppState;

/// GET /ncps/{id}/explanation
pub async fn get_explanation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Explanation>, ApiError> {
    load_owned(&state, id, &user).await?;
    ncps::load_explanation(&state.store, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No explanation has been generated for this NCP".to_string()))
}

/// POST /ncps/{id}/explanation
///
/// Generates (or regenerates) the explanation with the active provider and
/// saves it alongside the plan.
pub async fn generate_explanation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Explanation>, ApiError> {
    let plan = load_owned(&state, id, &user).await?;
    let generator = state.providers.active().await?;

    let mut log = CallLog::default();
    let explanation = pipeline::generate_explanation(generator.as_ref(), &plan, &mut log).await?;
    ncps::save_explanation(&state.store, &explanation).await?;

    let tokens = log.tokens();
    AuditEvent::new(
        AuditAction::GenerateExplanation,
        id.to_string(),
        user.owner().unwrap_or("anonymous"),
    )
    .with_details(json!({
        "provider": generator.provider(),
        "sections": explanation.sections.len(),
        "input_tokens": tokens.input,
        "output_tokens": tokens.output,
    }))
    .emit();

    Ok(Json(explanation))
}
