//! Per-request record of an NCP generation.
//!
//! Each request owns its own [`RequestTrace`]. The trace collects every AI
//! call, completed step and error, and on completion is written to
//! `<dir>/ncp_request_<YYYYmmdd_HHMMSS>_<id8>.json`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use ncp_core::health::RequestMetrics;
use ncp_core::models::assessment::AssessmentPayload;
use ncp_core::models::transaction::{AiCall, PipelineStep};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuditError;

pub const DEFAULT_REQUESTS_DIR: &str = "ncp_requests";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    InProgress,
    Completed,
    Failed,
    Partial,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Failed => "failed",
            RequestStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of the assessment, never its content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    #[serde(rename = "type")]
    pub mode: String,
    pub format_type: u8,
    pub subjective_count: usize,
    pub objective_count: usize,
    pub has_subjective: bool,
    pub has_objective: bool,
}

impl AssessmentSummary {
    pub fn of(payload: &AssessmentPayload) -> Self {
        let subjective_count = payload.section_lines("subjective").len();
        let objective_count = payload.section_lines("objective").len();
        Self {
            mode: payload.mode().to_string(),
            format_type: payload.format_type().as_u8(),
            subjective_count,
            objective_count,
            has_subjective: subjective_count > 0,
            has_objective: objective_count > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalTokens {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_billable: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceError {
    pub timestamp: Timestamp,
    pub step: PipelineStep,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<serde_json::Value>,
}

/// What the request produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub has_diagnosis: bool,
    pub has_ncp: bool,
    pub diagnosis_name: Option<String>,
    pub diagnosis_reasoning: Option<String>,
    pub ncp_sections: Vec<String>,
}

/// The persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub request_id: Uuid,
    pub request_type: String,
    pub start_time: Timestamp,
    pub status: RequestStatus,
    pub assessment_summary: AssessmentSummary,
    pub api_calls: Vec<AiCall>,
    pub total_tokens: TotalTokens,
    pub steps_completed: Vec<PipelineStep>,
    pub errors: Vec<TraceError>,
    pub result_summary: Option<ResultSummary>,
    pub end_time: Option<Timestamp>,
    pub duration_seconds: Option<f64>,
}

impl RequestRecord {
    pub fn file_name(&self) -> String {
        let id = self.request_id.simple().to_string();
        format!(
            "ncp_request_{}_{}.json",
            self.start_time.strftime("%Y%m%d_%H%M%S"),
            &id[..8]
        )
    }

    /// Calls per provider, e.g. `claude: 2`.
    pub fn calls_by_provider(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for call in &self.api_calls {
            *counts.entry(call.provider.to_string()).or_default() += 1;
        }
        counts
    }

    /// One-line summary for the log.
    pub fn summary_line(&self) -> String {
        let id = self.request_id.simple().to_string();
        let providers = self
            .calls_by_provider()
            .iter()
            .map(|(p, n)| format!("{p}: {n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let steps = self
            .steps_completed
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" -> ");
        format!(
            "NCP REQUEST COMPLETED - ID: {}... | Status: {} | Duration: {:.2}s | API Calls: {} ({}) | Tokens: {} in / {} out | Steps: {} | Errors: {}",
            &id[..8],
            self.status,
            self.duration_seconds.unwrap_or_default(),
            self.api_calls.len(),
            if providers.is_empty() { "none".to_string() } else { providers },
            self.total_tokens.input_tokens,
            self.total_tokens.output_tokens,
            if steps.is_empty() { "none".to_string() } else { steps },
            self.errors.len(),
        )
    }
}

/// The in-flight record of one request.
#[derive(Debug, Clone)]
pub struct RequestTrace {
    record: RequestRecord,
}

impl RequestTrace {
    pub fn start(request_type: impl Into<String>, payload: &AssessmentPayload) -> Self {
        Self::start_at(request_type, payload, Timestamp::now())
    }

    pub fn start_at(request_type: impl Into<String>, payload: &AssessmentPayload, now: Timestamp) -> Self {
        let record = RequestRecord {
            request_id: Uuid::new_v4(),
            request_type: request_type.into(),
            start_time: now,
            status: RequestStatus::InProgress,
            assessment_summary: AssessmentSummary::of(payload),
            api_calls: Vec::new(),
            total_tokens: TotalTokens::default(),
            steps_completed: Vec::new(),
            errors: Vec::new(),
            result_summary: None,
            end_time: None,
            duration_seconds: None,
        };
        info!(request_id = %record.request_id, request_type = %record.request_type, "NCP request started");
        Self { record }
    }

    pub fn id(&self) -> Uuid {
        self.record.request_id
    }

    pub fn record(&self) -> &RequestRecord {
        &self.record
    }

    pub fn record_call(&mut self, call: AiCall) {
        let tokens = call.usage.tokens;
        let totals = &mut self.record.total_tokens;
        totals.input_tokens += tokens.input;
        totals.output_tokens += tokens.output;
        totals.total_billable = totals.input_tokens + totals.output_tokens;
        self.record.api_calls.push(call);
    }

    pub fn record_calls(&mut self, calls: impl IntoIterator<Item = AiCall>) {
        for call in calls {
            self.record_call(call);
        }
    }

    pub fn step_completed(&mut self, step: PipelineStep) {
        self.record.steps_completed.push(step);
    }

    pub fn record_error(&mut self, step: PipelineStep, message: impl Into<String>, details: Option<serde_json::Value>) {
        let message = message.into();
        warn!(request_id = %self.record.request_id, %step, error = %message, "NCP request error");
        self.record.errors.push(TraceError {
            timestamp: Timestamp::now(),
            step,
            error_message: message,
            error_details: details,
        });
    }

    /// Close the record. Duration is rounded to two decimals.
    pub fn finish(self, status: RequestStatus, result: ResultSummary) -> RequestRecord {
        self.finish_at(status, result, Timestamp::now())
    }

    pub fn finish_at(mut self, status: RequestStatus, result: ResultSummary, now: Timestamp) -> RequestRecord {
        let elapsed = now.duration_since(self.record.start_time).as_secs_f64();
        self.record.status = status;
        self.record.result_summary = Some(result);
        self.record.end_time = Some(now);
        self.record.duration_seconds = Some((elapsed * 100.0).round() / 100.0);
        info!("{}", self.record.summary_line());
        self.record
    }
}

/// Write a finished record as pretty JSON under `dir`, creating it if needed.
pub async fn persist(dir: &Path, record: &RequestRecord) -> Result<PathBuf, AuditError> {
    tokio::fs::create_dir_all(dir).await.map_err(|source| AuditError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let path = dir.join(record.file_name());
    let body = serde_json::to_vec_pretty(record)?;
    tokio::fs::write(&path, body).await.map_err(|source| AuditError::Io {
        path: path.display().to_string(),
        source,
    })?;

    info!(request_id = %record.request_id, path = %path.display(), "NCP request record saved");
    Ok(path)
}

/// Every readable record under `dir`, oldest first. A missing directory
/// yields no records; unreadable files are skipped.
pub async fn load_records(dir: &Path) -> Result<Vec<RequestRecord>, AuditError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::Io {
                path: dir.display().to_string(),
                source,
            });
        }
    };

    let mut records = Vec::new();
    loop {
        let entry = entries.next_entry().await.map_err(|source| AuditError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let Some(entry) = entry else { break };
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let parsed = tokio::fs::read(&path)
            .await
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<RequestRecord>(&bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(record) => records.push(record),
            Err(error) => warn!(path = %path.display(), %error, "skipping unreadable request record"),
        }
    }

    records.sort_by_key(|r| r.start_time);
    Ok(records)
}

/// Aggregate figures over the finished requests in `records`.
pub fn metrics(records: &[RequestRecord]) -> RequestMetrics {
    let finished: Vec<&RequestRecord> = records
        .iter()
        .filter(|r| r.status != RequestStatus::InProgress)
        .collect();
    if finished.is_empty() {
        return RequestMetrics::default();
    }

    let total = finished.len();
    let completed = finished.iter().filter(|r| r.status == RequestStatus::Completed).count();
    let total_seconds: f64 = finished.iter().filter_map(|r| r.duration_seconds).sum();

    RequestMetrics {
        avg_response_time: (total_seconds * 1000.0 / total as f64).round() as u64,
        success_rate: (completed as f64 * 1000.0 / total as f64).round() / 10.0,
        total_requests: total,
    }
}

/// Records of requests started at or after `since`.
pub fn started_since(records: Vec<RequestRecord>, since: Timestamp) -> Vec<RequestRecord> {
    records.into_iter().filter(|r| r.start_time >= since).collect()
}

/// Errors recorded at or after `since`, newest first.
pub fn errors_since(records: &[RequestRecord], since: Timestamp) -> Vec<(Uuid, TraceError)> {
    let mut errors: Vec<(Uuid, TraceError)> = records
        .iter()
        .flat_map(|r| r.errors.iter().map(move |e| (r.request_id, e.clone())))
        .filter(|(_, e)| e.timestamp >= since)
        .collect();
    errors.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp));
    errors
}
