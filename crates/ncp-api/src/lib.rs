//! ncp-api
//!
//! HTTP backend for care plan generation, storage, explanations and
//! administration.

pub mod config;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod validation;

use axum::middleware as axum_mw;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Every route, with authentication and request logging applied.
pub fn router(state: AppState) -> Router {
    router_with_cors(state, CorsLayer::permissive())
}

pub fn router_with_cors(state: AppState, cors: CorsLayer) -> Router {
    let admin = Router::new()
        .route("/dashboard-stats", get(routes::admin::dashboard_stats))
        .route("/users", get(routes::admin::list_users))
        .route("/users/{id}", axum::routing::delete(routes::admin::delete_user))
        .route("/users/{id}/status", patch(routes::admin::update_user_status))
        .route("/users/{id}/admin-role", patch(routes::admin::update_admin_role))
        .route("/health", get(routes::admin::system_health))
        .route(
            "/ai-provider",
            get(routes::admin::get_ai_provider).put(routes::admin::set_ai_provider),
        );

    Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        .route("/generate-ncp", post(routes::generate::generate_ncp))
        .route("/validate-ncp", post(routes::generate::validate_ncp))
        .route("/ncps", get(routes::ncps::list_ncps))
        .route(
            "/ncps/{id}",
            get(routes::ncps::get_ncp)
                .put(routes::ncps::update_ncp)
                .delete(routes::ncps::delete_ncp),
        )
        .route("/ncps/{id}/export", get(routes::ncps::export_ncp))
        .route(
            "/ncps/{id}/explanation",
            get(routes::explanations::get_explanation).post(routes::explanations::generate_explanation),
        )
        .nest("/api/admin", admin)
        .layer(axum_mw::from_fn_with_state(state.clone(), middleware::auth::authenticate))
        .layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}
