//! Saved plans, explanations and exports.

use ncp_core::models::care_plan::{CarePlan, CarePlanUpdate};
use ncp_core::models::explanation::Explanation;
use reqwest::Method;
use uuid::Uuid;

use crate::client::NcpClient;
use crate::error::ClientError;

/// Export formats the backend renders.
pub const EXPORT_FORMATS: [&str; 5] = ["pdf", "docx", "csv", "png", "md"];

impl NcpClient {
    /// GET /health
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    /// GET /ncps
    pub async fn list_ncps(&self) -> Result<Vec<CarePlan>, ClientError> {
        self.get("/ncps").await
    }

    /// GET /ncps/{id}
    pub async fn get_ncp(&self, id: Uuid) -> Result<CarePlan, ClientError> {
        self.get(&format!("/ncps/{id}")).await
    }

    /// PUT /ncps/{id}
    pub async fn update_ncp(&self, id: Uuid, update: &CarePlanUpdate) -> Result<CarePlan, ClientError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ClientError::InvalidRequest("Title cannot be empty".to_string()));
        }
        self.put(&format!("/ncps/{id}"), update).await
    }

    /// DELETE /ncps/{id}
    pub async fn delete_ncp(&self, id: Uuid) -> Result<(), ClientError> {
        self.send_empty(self.request(Method::DELETE, &format!("/ncps/{id}")))
            .await
    }

    /// GET /ncps/{id}/explanation; `None` when none has been generated yet.
    pub async fn get_explanation(&self, id: Uuid) -> Result<Option<Explanation>, ClientError> {
        match self.get(&format!("/ncps/{id}/explanation")).await {
            Ok(explanation) => Ok(Some(explanation)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST /ncps/{id}/explanation
    pub async fn generate_explanation(&self, id: Uuid) -> Result<Explanation, ClientError> {
        self.send_json(self.request(Method::POST, &format!("/ncps/{id}/explanation")))
            .await
    }

    /// GET /ncps/{id}/export, returning the rendered file bytes.
    pub async fn export_ncp(&self, id: Uuid, format: &str, with_explanation: bool) -> Result<Vec<u8>, ClientError> {
        let format = format.trim().to_ascii_lowercase();
        if !EXPORT_FORMATS.contains(&format.as_str()) {
            return Err(ClientError::InvalidRequest(format!("Unsupported export format: {format}")));
        }
        let builder = self
            .request(Method::GET, &format!("/ncps/{id}/export"))
            .query(&[("format", format.as_str()), ("explanation", if with_explanation { "true" } else { "false" })]);
        self.send_bytes(builder).await
    }
}
