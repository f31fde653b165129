//! Runtime Configuration
//! Mission: Collect deployment settings once at startup

use std::env;
use tracing::warn;

use crate::auth::jwt::DEFAULT_TTL_SECS;

/// Fallback signing secret for local development only. Deployments must set
/// JWT_SECRET; startup logs a loud warning when the fallback is in use.
const DEV_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Immutable process-wide configuration, loaded once in `main`
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_path = env::var("AUTH_DB_PATH").unwrap_or_else(|_| "lore_library.db".to_string());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set, using development fallback. DO NOT deploy like this.");
                DEV_SECRET.to_string()
            }
        };

        let token_ttl_secs = parse_ttl(env::var("TOKEN_TTL_SECS").ok());

        Self {
            bind_addr,
            db_path,
            jwt_secret,
            token_ttl_secs,
        }
    }
}

fn parse_ttl(raw: Option<String>) -> i64 {
    raw.and_then(|v| v.parse::<i64>().ok())
        .filter(|ttl| *ttl > 0)
        .unwrap_or(DEFAULT_TTL_SECS)
}
