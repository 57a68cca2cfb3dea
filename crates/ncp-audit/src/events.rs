use std::fmt;

use serde::Serialize;
use tracing::info;

/// Actions that change stored data or platform settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    GenerateNcp,
    UpdateNcp,
    DeleteNcp,
    GenerateExplanation,
    SuspendUser,
    ActivateUser,
    DeleteUser,
    PromoteUser,
    DemoteUser,
    SetAiProvider,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::GenerateNcp => "generate_ncp",
            AuditAction::UpdateNcp => "update_ncp",
            AuditAction::DeleteNcp => "delete_ncp",
            AuditAction::GenerateExplanation => "generate_explanation",
            AuditAction::SuspendUser => "suspend_user",
            AuditAction::ActivateUser => "activate_user",
            AuditAction::DeleteUser => "delete_user",
            AuditAction::PromoteUser => "promote_user",
            AuditAction::DemoteUser => "demote_user",
            AuditAction::SetAiProvider => "set_ai_provider",
        }
    }

    /// The kind of resource the action touches.
    pub fn resource_type(self) -> &'static str {
        match self {
            AuditAction::GenerateNcp | AuditAction::UpdateNcp | AuditAction::DeleteNcp => "ncp",
            AuditAction::GenerateExplanation => "explanation",
            AuditAction::SuspendUser
            | AuditAction::ActivateUser
            | AuditAction::DeleteUser
            | AuditAction::PromoteUser
            | AuditAction::DemoteUser => "user",
            AuditAction::SetAiProvider => "setting",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured audit event, logged via `tracing`.
///
/// `actor` is the Cognito `sub` of the caller, or `anonymous` for
/// unauthenticated local runs.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_id: String,
    pub actor: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, resource_id: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            action,
            resource_id: resource_id.into(),
            actor: actor.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(serde_json::Value::to_string)
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = self.action.resource_type(),
            audit.resource_id = %self.resource_id,
            audit.actor = %self.actor,
            audit.details = %details,
            "audit event"
        );
    }
}
