//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but request-level errors
//! go through `auth::AuthError`.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use auth::{
    AuthConfig, MemoryAuthStore, PgAuthRepository, SessionService, auth_router,
    domain::repository::{RefreshTokenRepository, UnitOfWork, UserRepository},
};
use axum::{
    Router,
    http::{Method, header},
};
use chrono::Utc;
use platform::jwt::{AccessTokenSigner, AccessTokenVerifier};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Key material
    let private_key_pem = std::fs::read(&config.jwt_private_key_file)
        .with_context(|| format!("reading {}", config.jwt_private_key_file))?;
    let public_key_pem = std::fs::read(&config.jwt_public_key_file)
        .with_context(|| format!("reading {}", config.jwt_public_key_file))?;

    let signer = AccessTokenSigner::from_pem(
        config.auth.issuer.clone(),
        config.auth.algorithm,
        config.auth.access_token_ttl,
        &private_key_pem,
    )?;
    let verifier = Arc::new(AccessTokenVerifier::from_pem(
        &config.auth.issuer,
        config.auth.algorithm,
        &public_key_pem,
    )?);

    tracing::info!(
        issuer = %config.auth.issuer,
        algorithm = ?config.auth.algorithm,
        refresh_token_max_count = config.auth.refresh_token_max_count,
        "Access token keys loaded"
    );

    let auth_routes = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let repo = Arc::new(PgAuthRepository::new(pool));
            build_auth_routes(repo, &config.auth, signer, verifier).await
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sessions are kept in memory only");
            let store = Arc::new(MemoryAuthStore::new());
            build_auth_routes(store, &config.auth, signer, verifier).await
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origins.clone())
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/auth", auth_routes)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Run startup cleanup and build the auth routes for a store
async fn build_auth_routes<R>(
    repo: Arc<R>,
    config: &AuthConfig,
    signer: AccessTokenSigner,
    verifier: Arc<AccessTokenVerifier>,
) -> Router
where
    R: UserRepository + RefreshTokenRepository + UnitOfWork + Send + Sync + 'static,
{
    let service = SessionService::from_config(repo, config, signer);

    // Errors here should not prevent server startup
    match service.cleanup_expired(Utc::now()).await {
        Ok(deleted) => {
            tracing::info!(tokens_deleted = deleted, "Refresh token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Refresh token cleanup failed, continuing anyway"
            );
        }
    }

    auth_router(service, verifier, config.clone())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
