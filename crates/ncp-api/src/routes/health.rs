use axum::extract::State;
use axum::Json;
use serde::Serialize;

use ncp_core::models::transaction::ProviderKind;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
    pub provider: ProviderKind,
    pub lookup_entries: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        storage: state.store.backend_name(),
        provider: state.providers.current().await,
        lookup_entries: state.lookup.read().await.len(),
    })
}
