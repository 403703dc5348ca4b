//! Bearer-token authentication: HS256 token mint/verify, the
//! process-wide revocation set, and the middleware that fronts every
//! protected route.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::api::{ApiError, AppState};

mod revocation;
mod token;

pub use revocation::RevocationSet;
pub use token::{AuthError, Claims, TokenSigner};

/// Verified caller identity, inserted into request extensions by
/// `auth_middleware` and read back by handlers.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub token_id: String,
}

/// Authentication middleware for protected routes. Checks run in a
/// fixed order so every failure keeps its own diagnostic:
/// 1. `Authorization` header present
/// 2. header is `Bearer <token>`
/// 3. token decodes and has not expired
/// 4. token has not been revoked by a logout
/// 5. the subject still exists
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?;
    let claims = state.tokens().verify(token)?;

    if state.revoked_tokens().contains(&claims.jti).await {
        return Err(AuthError::Revoked.into());
    }

    let subject_exists = state
        .store()
        .user_exists(&claims.sub)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to look up token subject: {e}")))?;
    if !subject_exists {
        return Err(AuthError::UnknownSubject.into());
    }

    tracing::Span::current().record("user_id", claims.sub.as_str());
    request.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        token_id: claims.jti,
    });

    Ok(next.run(request).await)
}

/// Pull the raw token out of `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
