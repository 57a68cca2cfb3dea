//! Synthetic progress for long-running requests.
//!
//! The backend sends no progress events, so progress is estimated from
//! elapsed wall-clock time: linear over a two-minute reference window and
//! held at 90% until the response arrives.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Elapsed time that maps to 100% before capping.
pub const REFERENCE_WINDOW: Duration = Duration::from_secs(120);

/// Highest percentage shown while a request is still pending.
pub const PENDING_CAP: u8 = 90;

/// Estimated completion percentage for a request pending for `elapsed`.
pub fn estimate_percent(elapsed: Duration) -> u8 {
    let window = REFERENCE_WINDOW.as_millis();
    let pct = elapsed.as_millis().saturating_mul(100) / window;
    pct.min(PENDING_CAP as u128) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OperationKind {
    NcpGeneration,
    ExplanationGeneration,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::NcpGeneration => "Generating care plan",
            OperationKind::ExplanationGeneration => "Generating explanation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OperationStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl OperationStatus {
    pub fn is_finished(self) -> bool {
        !matches!(self, OperationStatus::Pending)
    }
}

/// A point-in-time view of one background operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressSnapshot {
    pub id: Uuid,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub percent: u8,
    pub elapsed_secs: u64,
}

impl ProgressSnapshot {
    /// Completed operations read 100%; pending ones use the estimate;
    /// failed or cancelled ones keep the estimate they stopped at.
    pub fn new(id: Uuid, kind: OperationKind, status: OperationStatus, elapsed: Duration) -> Self {
        let percent = match status {
            OperationStatus::Completed => 100,
            _ => estimate_percent(elapsed),
        };
        Self {
            id,
            kind,
            status,
            percent,
            elapsed_secs: elapsed.as_secs(),
        }
    }

    /// Elapsed time as `m:ss`.
    pub fn elapsed_display(&self) -> String {
        format!("{}:{:02}", self.elapsed_secs / 60, self.elapsed_secs % 60)
    }
}
