//! HTTP Handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use std::sync::Arc;

use platform::cookie::extract_cookie;
use platform::crypto::constant_time_eq;

use crate::application::config::AuthConfig;
use crate::application::{RefreshInput, SessionService, SessionTokens, SignInInput, SignUpInput};
use crate::domain::repository::{RefreshTokenRepository, UnitOfWork, UserRepository};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccessTokenResponse, LoginRequest, RefreshRequest, SessionResponse, SignUpRequest,
    SignUpResponse,
};
use crate::presentation::middleware::AuthenticatedUser;

/// Shared state for auth handlers
pub struct AuthAppState<R> {
    pub service: SessionService<R>,
    pub config: Arc<AuthConfig>,
}

impl<R> Clone for AuthAppState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            config: self.config.clone(),
        }
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<Json<SignUpResponse>>
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    if !constant_time_eq(req.password.as_bytes(), req.confirm_password.as_bytes()) {
        return Err(AuthError::PasswordValidation(
            "Passwords do not match".to_string(),
        ));
    }

    let output = state
        .service
        .sign_up(SignUpInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(SignUpResponse {
        id: output.user_id.to_string(),
        email: output.email.into_db(),
    }))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R>(
    State(state): State<AuthAppState<R>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    let tokens = state
        .service
        .login(
            SignInInput {
                email: req.email,
                password: req.password,
                fingerprint: req.fingerprint,
            },
            Utc::now(),
        )
        .await?;

    session_response(&state.config, tokens)
}

// ============================================================================
// Refresh
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    let refresh_token_id = extract_cookie(&headers, &state.config.refresh_cookie_name)
        .ok_or(AuthError::MissingRefreshToken)?;

    let tokens = state
        .service
        .refresh(
            RefreshInput {
                refresh_token_id,
                fingerprint: req.fingerprint,
            },
            Utc::now(),
        )
        .await?;

    session_response(&state.config, tokens)
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<R>(
    State(state): State<AuthAppState<R>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    let refresh_token_id = extract_cookie(&headers, &state.config.refresh_cookie_name)
        .ok_or(AuthError::MissingRefreshToken)?;

    state.service.logout(&refresh_token_id).await?;

    let cookie = state
        .config
        .refresh_cookie()
        .delete_cookie_header()
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)]))
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/auth/me (behind `require_access_token`)
pub async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<SessionResponse> {
    Json(SessionResponse {
        email: user.email,
        token_id: user.token_id,
        expires_at: user.expires_at,
    })
}

// ============================================================================
// Helpers
// ============================================================================

/// Access token in the body, refresh token id in an HttpOnly cookie
fn session_response(config: &AuthConfig, tokens: SessionTokens) -> AuthResult<Response> {
    let max_age = u64::try_from(tokens.refresh_token_ttl_secs).unwrap_or(0);
    let cookie = config
        .refresh_cookie()
        .set_cookie_header(&tokens.refresh_token_id.to_string(), max_age)
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
            expires_at: tokens.access_token_expires_at,
        }),
    )
        .into_response())
}
