use std::sync::Arc;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use ncp_ai::claude::ClaudeBedrock;
use ncp_ai::gemini::GeminiClient;
use ncp_ai::generator::TextGenerator;
use ncp_ai::provider::ProviderRegistry;
use ncp_api::config::ApiConfig;
use ncp_api::state::AppState;
use ncp_auth::client::Cognito;
use ncp_auth::jwt::JwtVerifier;
use ncp_storage::ncps;
use ncp_storage::store::Store;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging for CloudWatch
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = ApiConfig::from_env();

    let store = match &config.bucket {
        Some(bucket) => {
            let s3 = ncp_storage::client::build_client_with_region(&config.region).await;
            Store::s3(s3, bucket)
        }
        None => {
            tracing::warn!("NCP_BUCKET not set, using in-memory storage");
            Store::in_memory()
        }
    };

    // An empty or missing lookup table still starts; generation then ends
    // as partial with no candidates.
    let lookup = ncp_search::index::load_index(&store).await?;
    tracing::info!(entries = lookup.len(), "diagnosis lookup loaded");

    let mut generators: Vec<Arc<dyn TextGenerator>> = Vec::new();
    if config.claude_enabled {
        let bedrock = ncp_ai::client::build_client_with_region(&config.region).await;
        generators.push(Arc::new(ClaudeBedrock::with_default_model(bedrock)));
    }
    if let Some(key) = &config.gemini_api_key {
        generators.push(Arc::new(GeminiClient::with_default_model(key.as_str())?));
    }
    let providers = ProviderRegistry::new(generators);
    let saved = ncps::load_provider_setting(&store).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not load saved AI provider");
        None
    });
    providers.restore(saved).await;

    let mut state = AppState::new(store, lookup, providers)
        .with_requests_dir(&config.requests_dir)
        .with_environment(&config.environment);

    if let Some(secret) = &config.jwt_secret {
        tracing::warn!("verifying tokens with a shared secret");
        state = state.with_verifier(JwtVerifier::hs256(secret.as_bytes()));
    } else if let Some(pool) = &config.user_pool_id {
        state = state.with_verifier(JwtVerifier::fetch(&config.region, pool).await?);
    } else {
        tracing::warn!("no token verification configured, API is unauthenticated");
    }

    if let (Some(pool), Some(client_id)) = (&config.user_pool_id, &config.client_id) {
        state = state.with_cognito(Cognito::connect(Some(config.region.as_str()), pool, client_id).await);
    }

    let cors = match &config.allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = ncp_api::router_with_cors(state, cors);

    match config.port {
        Some(port) => {
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
            tracing::info!(port, "listening");
            axum::serve(listener, app).await?;
            Ok(())
        }
        None => lambda_http::run(app).await.map_err(|e| eyre::eyre!(e)),
    }
}
