use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use ncp_audit::events::{AuditAction, AuditEvent};
use ncp_core::models::care_plan::{CarePlan, CarePlanUpdate};
use ncp_export::styles::DocumentStyles;
use ncp_export::ExportFormat;
use ncp_storage::ncps;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a plan the caller may see. Plans of other users read as missing.
pub(crate) async fn load_owned(state: &AppState, id: Uuid, user: &AuthUser) -> Result<CarePlan, ApiError> {
    let plan = ncps::load_ncp(&state.store, id).await?;
    match (user.owner(), plan.user_id.as_deref()) {
        (Some(owner), Some(plan_owner)) if owner != plan_owner => Err(ApiError::NotFound("NCP not found".to_string())),
        _ => Ok(plan),
    }
}

fn actor(user: &AuthUser) -> &str {
    user.owner().unwrap_or("anonymous")
}

/// GET /ncps
pub async fn list_ncps(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<CarePlan>>, ApiError> {
    let plans = ncps::list_ncps(&state.store, user.owner()).await?;
    Ok(Json(plans))
}

/// GET /ncps/{id}
pub async fn get_ncp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CarePlan>, ApiError> {
    Ok(Json(load_owned(&state, id, &user).await?))
}

/// PUT /ncps/{id}
pub async fn update_ncp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(update): Json<CarePlanUpdate>,
) -> Result<Json<CarePlan>, ApiError> {
    if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("Title cannot be empty".to_string()));
    }

    let mut plan = load_owned(&state, id, &user).await?;
    update.apply(&mut plan);
    ncps::save_ncp(&state.store, &plan).await?;

    AuditEvent::new(AuditAction::UpdateNcp, id.to_string(), actor(&user)).emit();
    Ok(Json(plan))
}

/// DELETE /ncps/{id}
pub async fn delete_ncp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    load_owned(&state, id, &user).await?;
    ncps::delete_ncp(&state.store, id).await?;

    AuditEvent::new(AuditAction::DeleteNcp, id.to_string(), actor(&user)).emit();
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: String,
    #[serde(default = "default_true")]
    pub explanation: bool,
}

fn default_true() -> bool {
    true
}

/// GET /ncps/{id}/export?format=pdf|csv|docx|png|md
///
/// The saved explanation is appended unless `explanation=false`.
pub async fn export_ncp(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let format: ExportFormat = query.format.parse()?;
    let plan = load_owned(&state, id, &user).await?;
    let explanation = if query.explanation {
        ncps::load_explanation(&state.store, id).await?
    } else {
        None
    };

    let file_name = ncp_export::file_name(&plan, format);
    let bytes = tokio::task::spawn_blocking(move || {
        ncp_export::export(&plan, explanation.as_ref(), format, &DocumentStyles::default())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("export task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, format.mime_type().to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{file_name}\"")),
        ],
        bytes,
    )
        .into_response())
}
