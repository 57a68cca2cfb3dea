//! Admin system-health report and provider switch result, shared by the
//! API and its clients.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::transaction::ProviderKind;

pub const HEALTHY: &str = "healthy";
pub const ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComponentStatus {
    /// `healthy` or `error`.
    pub status: String,
    pub message: String,
}

impl ComponentStatus {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HEALTHY.to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ERROR.to_string(),
            message: message.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HEALTHY
    }
}

/// Aggregate figures over finished requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RequestMetrics {
    /// Mean duration in milliseconds.
    pub avg_response_time: u64,
    /// Percentage of requests that completed, one decimal place.
    pub success_rate: f64,
    pub total_requests: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthReport {
    pub backend: ComponentStatus,
    pub storage: ComponentStatus,
    pub claude: ComponentStatus,
    pub gemini: ComponentStatus,
    #[serde(default)]
    pub metrics: RequestMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ErrorLog {
    pub request_id: Uuid,
    pub timestamp: Timestamp,
    pub step: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SystemInfo {
    pub environment: String,
    pub version: String,
    pub uptime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SystemHealth {
    pub health: HealthReport,
    #[serde(default)]
    pub error_logs: Vec<ErrorLog>,
    pub system_info: SystemInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProviderChanged {
    pub success: bool,
    pub message: String,
    pub provider: ProviderKind,
}
