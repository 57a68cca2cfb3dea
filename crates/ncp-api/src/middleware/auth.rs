use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use ncp_auth::error::AuthError;
use ncp_auth::jwt::{self, ACCOUNT_SUSPENDED};
use ncp_auth::users;
use ncp_core::models::user::Identity;

use crate::error::ApiError;
use crate::state::AppState;

/// Paths reachable without a token.
const PUBLIC_PATHS: &[&str] = &["/health"];

/// Authenticated user extracted from JWT claims. `None` when the API runs
/// without a verifier or the path is public.
#[derive(Clone, Debug, Default)]
pub struct AuthUser(pub Option<Identity>);

impl AuthUser {
    /// Owner id that stored plans are scoped to.
    pub fn owner(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.sub.as_str())
    }
}

/// JWT validation middleware.
///
/// Verifies `Authorization: Bearer <token>` against the configured key set
/// and inserts [`AuthUser`] into the request (and response) extensions.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let user = match &state.verifier {
        Some(verifier) if !PUBLIC_PATHS.contains(&req.uri().path()) => {
            let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
            let identity = verifier.authenticate(header)?;
            if identity.is_suspended {
                return Err(ApiError::Forbidden(ACCOUNT_SUSPENDED.to_string()));
            }
            AuthUser(Some(identity))
        }
        _ => AuthUser(None),
    };

    req.extensions_mut().insert(user.clone());
    let mut response = next.run(req).await;
    response.extensions_mut().insert(user);
    Ok(response)
}

fn identity_of(parts: &Parts) -> Result<Identity, ApiError> {
    parts
        .extensions
        .get::<AuthUser>()
        .and_then(|u| u.0.clone())
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthUser>().cloned().unwrap_or_default())
    }
}

/// The caller's identity with admin flags read from the user pool when one
/// is configured, so role changes and suspensions apply before the token
/// expires.
async fn live_identity(parts: &Parts, state: &AppState) -> Result<Identity, ApiError> {
    let identity = identity_of(parts)?;
    let Some(cognito) = state.cognito.as_ref() else {
        return Ok(identity);
    };
    match users::get_user(cognito, &identity.sub).await {
        Ok(user) => Ok(user.current_identity(identity)),
        Err(AuthError::UserNotFound(_)) => Err(ApiError::Unauthorized("Invalid token".to_string())),
        Err(e) => {
            tracing::error!(error = %e, sub = %identity.sub, "admin verification failed");
            Err(ApiError::Unauthorized("Authentication failed".to_string()))
        }
    }
}

/// A signed-in, non-suspended admin.
#[derive(Clone, Debug)]
pub struct AdminUser(pub Identity);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = live_identity(parts, state).await?;
        jwt::require_admin(&identity)?;
        Ok(AdminUser(identity))
    }
}

/// An admin with the `super` level.
#[derive(Clone, Debug)]
pub struct SuperAdmin(pub Identity);

impl FromRequestParts<AppState> for SuperAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = live_identity(parts, state).await?;
        jwt::require_super_admin(&identity)?;
        Ok(SuperAdmin(identity))
    }
}
