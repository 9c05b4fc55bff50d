//! Auth Middleware
//!
//! Middleware for requiring a valid access token on protected routes.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;
use platform::jwt::AccessTokenVerifier;
use std::sync::Arc;

use crate::error::AuthError;

/// Middleware state
///
/// Holds only the verifier (public key); protected services never see the
/// signing key.
#[derive(Clone)]
pub struct AccessTokenState {
    pub verifier: Arc<AccessTokenVerifier>,
}

/// Verified access token holder, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Token subject
    pub email: String,
    /// Token id (`jti`)
    pub token_id: String,
    /// Unix seconds
    pub expires_at: i64,
}

/// Middleware that requires `Authorization: Bearer <access token>`
pub async fn require_access_token(
    State(state): State<AccessTokenState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_bearer_token(req.headers()).ok_or(AuthError::MissingBearerToken)?;
    let claims = state.verifier.verify(token)?;

    req.extensions_mut().insert(AuthenticatedUser {
        email: claims.sub,
        token_id: claims.jti,
        expires_at: claims.exp,
    });

    Ok(next.run(req).await)
}
