use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::middleware::auth::AuthUser;

/// Request logging middleware.
///
/// Logs every API request as a structured event using `tracing`, with the
/// caller's subject when the auth layer identified one.
pub async fn audit_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let user = response
        .extensions()
        .get::<AuthUser>()
        .and_then(|u| u.0.as_ref())
        .map(|identity| identity.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    tracing::info!(
        method = %method,
        path = %uri,
        status = status,
        user = %user,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "api_request"
    );

    response
}
