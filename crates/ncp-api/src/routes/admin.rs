//! `/api/admin/*`. Every handler takes an [`AdminUser`] or [`SuperAdmin`]
//! extractor, so the gate runs before any work is done.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use jiff::{Timestamp, ToSpan};
use serde::Deserialize;
use serde_json::json;

use ncp_ai::error::AiError;
use ncp_ai::provider::ProviderStatus;
use ncp_audit::events::{AuditAction, AuditEvent};
use ncp_audit::tracker;
use ncp_auth::client::Cognito;
use ncp_auth::users;
use ncp_core::health::{ComponentStatus, ErrorLog, HealthReport, ProviderChanged, SystemHealth, SystemInfo};
use ncp_core::models::care_plan::CarePlan;
use ncp_core::models::transaction::ProviderKind;
use ncp_core::models::user::{ActionResult, AdminRoleUpdate, UserRecord, UserStatusUpdate};
use ncp_core::stats::DashboardStats;
use ncp_storage::ncps;

use crate::error::ApiError;
use crate::middleware::auth::{AdminUser, SuperAdmin};
use crate::state::AppState;

pub const DELETED_MESSAGE: &str = "User and all associated data deleted successfully";

fn pool(state: &AppState) -> Result<&Cognito, ApiError> {
    state
        .cognito
        .as_ref()
        .ok_or_else(|| ApiError::ServiceUnavailable("User management is not configured".to_string()))
}

fn counts_by_owner(plans: &[CarePlan]) -> HashMap<&str, u64> {
    let mut counts = HashMap::new();
    for owner in plans.iter().filter_map(|p| p.user_id.as_deref()) {
        *counts.entry(owner).or_default() += 1;
    }
    counts
}

/// Admin table rows for every pool user. Without a pool there are none.
async fn user_records(state: &AppState, plans: &[CarePlan]) -> Result<Vec<UserRecord>, ApiError> {
    let Some(cognito) = state.cognito.as_ref() else {
        return Ok(Vec::new());
    };
    let counts = counts_by_owner(plans);
    let records = users::list_users(cognito)
        .await?
        .iter()
        .map(|user| {
            let mut record = user.to_record(0);
            record.ncp_count = counts.get(record.id.as_str()).copied().unwrap_or(0);
            record
        })
        .collect();
    Ok(records)
}

/// GET /api/admin/dashboard-stats
pub async fn dashboard_stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<DashboardStats>, ApiError> {
    let plans = ncps::list_ncps(&state.store, None).await?;
    let users = user_records(&state, &plans).await?;
    tracing::info!(users = users.len(), ncps = plans.len(), "computing dashboard stats");
    Ok(Json(DashboardStats::compute(&users, &plans, Timestamp::now())))
}

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<UserRecord>>, ApiError> {
    pool(&state)?;
    let plans = ncps::list_ncps(&state.store, None).await?;
    Ok(Json(user_records(&state, &plans).await?))
}

/// PATCH /api/admin/users/{id}/status
pub async fn update_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
    Json(update): Json<UserStatusUpdate>,
) -> Result<Json<ActionResult>, ApiError> {
    let cognito = pool(&state)?;
    let target = users::get_user(cognito, &user_id).await?;
    let message = users::set_suspended(cognito, &target.username, update.suspended).await?;

    let action = if update.suspended {
        AuditAction::SuspendUser
    } else {
        AuditAction::ActivateUser
    };
    AuditEvent::new(action, &user_id, &admin.sub).emit();
    Ok(Json(ActionResult::ok(message)))
}

/// DELETE /api/admin/users/{id}
///
/// Removes the user's plans (and their explanations) before the account.
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<ActionResult>, ApiError> {
    let cognito = pool(&state)?;
    let target = users::get_user(cognito, &user_id).await?;
    users::check_can_delete(&target)?;

    let owner = target.to_record(0).id;
    let plans = ncps::list_ncps(&state.store, Some(&owner)).await?;
    for plan in &plans {
        ncps::delete_ncp(&state.store, plan.id).await?;
    }
    users::delete_user(cognito, &target).await?;

    AuditEvent::new(AuditAction::DeleteUser, &user_id, &admin.sub)
        .with_details(json!({ "ncps_deleted": plans.len() }))
        .emit();
    Ok(Json(ActionResult::ok(DELETED_MESSAGE)))
}

/// PATCH /api/admin/users/{id}/admin-role
pub async fn update_admin_role(
    State(state): State<AppState>,
    SuperAdmin(admin): SuperAdmin,
    Path(user_id): Path<String>,
    Json(update): Json<AdminRoleUpdate>,
) -> Result<Json<ActionResult>, ApiError> {
    let cognito = pool(&state)?;
    let target = users::get_user(cognito, &user_id).await?;
    let message = users::set_admin_role(cognito, &target, &update).await?;

    let action = if update.is_admin {
        AuditAction::PromoteUser
    } else {
        AuditAction::DemoteUser
    };
    AuditEvent::new(action, &user_id, &admin.sub)
        .with_details(json!({ "admin_level": update.admin_level.as_str() }))
        .emit();
    Ok(Json(ActionResult::ok(message)))
}

/// `3d 4h 12m`, dropping leading zero units.
pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (days, hours, minutes) = (seconds / 86_400, seconds % 86_400 / 3_600, seconds % 3_600 / 60);
    match (days, hours) {
        (0, 0) => format!("{minutes}m"),
        (0, _) => format!("{hours}h {minutes}m"),
        _ => format!("{days}d {hours}h {minutes}m"),
    }
}

async fn provider_status(state: &AppState, kind: ProviderKind) -> ComponentStatus {
    if !state.providers.is_available(kind) {
        return ComponentStatus::error("Not configured");
    }
    if state.providers.current().await == kind {
        ComponentStatus::healthy("Configured (active)")
    } else {
        ComponentStatus::healthy("Configured")
    }
}

/// GET /api/admin/health
pub async fn system_health(State(state): State<AppState>, _admin: AdminUser) -> Json<SystemHealth> {
    let storage = match state.store.ping().await {
        Ok(()) => ComponentStatus::healthy(format!("Storage connected ({})", state.store.backend_name())),
        Err(e) => ComponentStatus::error(format!("Storage error: {e}")),
    };

    let records = tracker::load_records(&state.requests_dir).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read request records");
        Vec::new()
    });
    let since = Timestamp::now().checked_sub(24.hours()).unwrap_or(Timestamp::MIN);
    let records = tracker::started_since(records, since);
    let error_logs = tracker::errors_since(&records, since)
        .into_iter()
        .map(|(request_id, e)| ErrorLog {
            request_id,
            timestamp: e.timestamp,
            step: e.step.to_string(),
            message: e.error_message,
        })
        .collect();

    let uptime = Timestamp::now().duration_since(state.started_at).as_secs();

    Json(SystemHealth {
        health: HealthReport {
            backend: ComponentStatus::healthy("Backend API operational"),
            storage,
            claude: provider_status(&state, ProviderKind::Claude).await,
            gemini: provider_status(&state, ProviderKind::Gemini).await,
            metrics: tracker::metrics(&records),
        },
        error_logs,
        system_info: SystemInfo {
            environment: state.environment.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: format_uptime(uptime),
        },
    })
}

/// GET /api/admin/ai-provider
pub async fn get_ai_provider(State(state): State<AppState>, _admin: AdminUser) -> Json<ProviderStatus> {
    Json(state.providers.status().await)
}

#[derive(Debug, Deserialize)]
pub struct ProviderUpdate {
    pub provider: String,
}

/// PUT /api/admin/ai-provider
///
/// Switches the active provider and persists the choice. A failed save
/// restores the previous provider.
pub async fn set_ai_provider(
    State(state): State<AppState>,
    SuperAdmin(admin): SuperAdmin,
    Json(update): Json<ProviderUpdate>,
) -> Result<Json<ProviderChanged>, ApiError> {
    let provider: ProviderKind = update.provider.parse().map_err(AiError::InvalidProvider)?;
    if !state.providers.is_available(provider) {
        return Err(ApiError::BadRequest(AiError::ProviderUnavailable(provider).to_string()));
    }
    let store = &state.store;
    state
        .providers
        .set_persisted(provider, |kind| async move {
            ncps::save_provider_setting(store, kind).await.map_err(ApiError::from)
        })
        .await?;

    AuditEvent::new(AuditAction::SetAiProvider, provider.as_str(), &admin.sub).emit();
    Ok(Json(ProviderChanged {
        success: true,
        message: format!("AI provider switched to {provider}"),
        provider,
    }))
}
