use std::path::PathBuf;
use std::sync::Arc;

use jiff::Timestamp;
use ncp_ai::provider::ProviderRegistry;
use ncp_auth::client::Cognito;
use ncp_auth::jwt::JwtVerifier;
use ncp_search::index::LookupIndex;
use ncp_storage::store::Store;
use tokio::sync::RwLock;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub lookup: Arc<RwLock<LookupIndex>>,
    pub providers: Arc<ProviderRegistry>,
    /// `None` runs the API without authentication (local development).
    pub verifier: Option<Arc<JwtVerifier>>,
    /// User pool for the admin endpoints. `None` disables user management.
    pub cognito: Option<Cognito>,
    pub requests_dir: PathBuf,
    pub environment: String,
    pub started_at: Timestamp,
}

impl AppState {
    pub fn new(store: Store, lookup: LookupIndex, providers: ProviderRegistry) -> Self {
        Self {
            store,
            lookup: Arc::new(RwLock::new(lookup)),
            providers: Arc::new(providers),
            verifier: None,
            cognito: None,
            requests_dir: PathBuf::from(ncp_audit::tracker::DEFAULT_REQUESTS_DIR),
            environment: "development".to_string(),
            started_at: Timestamp::now(),
        }
    }

    pub fn with_verifier(mut self, verifier: JwtVerifier) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn with_cognito(mut self, cognito: Cognito) -> Self {
        self.cognito = Some(cognito);
        self
    }

    pub fn with_requests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.requests_dir = dir.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}
