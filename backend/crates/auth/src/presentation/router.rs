//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use platform::jwt::AccessTokenVerifier;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::SessionService;
use crate::domain::repository::{RefreshTokenRepository, UnitOfWork, UserRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{AccessTokenState, require_access_token};

/// Create the Auth router for any store implementation
///
/// Mount under `/api/auth` so the refresh cookie path matches.
pub fn auth_router<R>(
    service: SessionService<R>,
    verifier: Arc<AccessTokenVerifier>,
    config: AuthConfig,
) -> Router
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    let state = AuthAppState {
        service,
        config: Arc::new(config),
    };

    let protected = Router::new()
        .route("/me", get(handlers::me))
        .route_layer(middleware::from_fn_with_state(
            AccessTokenState { verifier },
            require_access_token,
        ));

    Router::new()
        .route("/signup", post(handlers::sign_up::<R>))
        .route("/login", post(handlers::login::<R>))
        .route("/refresh", post(handlers::refresh::<R>))
        .route("/logout", post(handlers::logout::<R>))
        .with_state(state)
        .merge(protected)
}
