//! Admin dashboard operations under `/api/admin`.

use ncp_core::health::{ProviderChanged, SystemHealth};
use ncp_core::models::transaction::ProviderKind;
use ncp_core::models::user::{ActionResult, AdminLevel, AdminRoleUpdate, UserRecord, UserStatusUpdate};
use ncp_core::stats::DashboardStats;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::client::NcpClient;
use crate::error::ClientError;

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    pub available_providers: Vec<ProviderKind>,
}

impl NcpClient {
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.get("/api/admin/dashboard-stats").await
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, ClientError> {
        self.get("/api/admin/users").await
    }

    pub async fn set_user_suspended(&self, user_id: &str, suspended: bool) -> Result<ActionResult, ClientError> {
        self.patch(&format!("/api/admin/users/{user_id}/status"), &UserStatusUpdate { suspended })
            .await
    }

    /// Deletes the user and every plan they own.
    pub async fn delete_user(&self, user_id: &str) -> Result<ActionResult, ClientError> {
        self.send_json(self.request(Method::DELETE, &format!("/api/admin/users/{user_id}")))
            .await
    }

    pub async fn set_admin_role(
        &self,
        user_id: &str,
        is_admin: bool,
        admin_level: AdminLevel,
    ) -> Result<ActionResult, ClientError> {
        let body = AdminRoleUpdate { is_admin, admin_level };
        self.patch(&format!("/api/admin/users/{user_id}/admin-role"), &body)
            .await
    }

    pub async fn system_health(&self) -> Result<SystemHealth, ClientError> {
        self.get("/api/admin/health").await
    }

    pub async fn ai_provider(&self) -> Result<ProviderStatus, ClientError> {
        self.get("/api/admin/ai-provider").await
    }

    pub async fn set_ai_provider(&self, provider: ProviderKind) -> Result<ProviderChanged, ClientError> {
        self.put("/api/admin/ai-provider", &json!({ "provider": provider.as_str() }))
            .await
    }
}
