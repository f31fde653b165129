//! Lore Library - Identity & Access service
//!
//! HTTP backend providing registration, login, credential verification, and
//! role-gated account administration for the Lore Library manga tracker.

use anyhow::{Context, Result};
use axum::{middleware as axum_middleware, routing::get, Router};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lore_library_backend::{
    auth::{self, AccountStore, AuthState, JwtHandler},
    config::Config,
    middleware::request_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = Config::from_env();

    info!("📚 Lore Library identity service starting");

    let account_store =
        Arc::new(AccountStore::new(&config.db_path).context("Failed to open account store")?);
    let jwt_handler = Arc::new(JwtHandler::new(
        config.jwt_secret.clone(),
        config.token_ttl_secs,
    ));
    let auth_state = AuthState::new(account_store, jwt_handler);

    info!("🔐 Account store initialized at: {}", config.db_path);

    let app = Router::new()
        .route("/health", get(health_check))
        .merge(auth::router(auth_state))
        .layer(axum_middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lore_library_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn health_check() -> &'static str {
    "📚 Lore Library Operational"
}
