use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::auth::JwtVerifier;

/// User context injected into request extensions when a valid bearer token is present
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

/// Optional identity middleware.
///
/// Requests without a usable bearer token continue as anonymous callers and
/// are accounted by IP address.
pub async fn identity_middleware(
    State(verifier): State<Arc<JwtVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    if let Some(token) = token {
        match verifier.extract_user_id(token) {
            Ok(user_id) => {
                request.extensions_mut().insert(AuthUser { user_id });
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid bearer token");
            }
        }
    }

    next.run(request).await
}
