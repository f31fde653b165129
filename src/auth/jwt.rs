//! Bearer Credential Handler
//! Mission: Issue and verify signed, time-bounded identity tokens

use crate::auth::models::Claims;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// Default credential validity window: 24 hours
pub const DEFAULT_TTL_SECS: i64 = 24 * 3600;

/// Stateless JWT issuer/verifier. The signing secret is process-wide and
/// injected at startup; no token is ever persisted or revoked server-side.
pub struct JwtHandler {
    secret: String,
    ttl_secs: i64,
}

impl JwtHandler {
    /// Create a handler with the given signing secret and validity window
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    /// Issue a credential for an account id, returning the encoded token and
    /// its remaining lifetime in seconds
    pub fn issue(&self, account_id: &Uuid) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiry = now
            .checked_add_signed(chrono::Duration::seconds(self.ttl_secs))
            .context("Invalid expiry timestamp")?;

        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp() as usize,
            exp: expiry.timestamp() as usize,
        };

        debug!(account_id = %account_id, ttl_secs = self.ttl_secs, "Issuing credential");

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to encode credential")?;

        Ok((token, self.ttl_secs.max(0) as usize))
    }

    /// Verify a credential's signature and expiry, returning its claims.
    /// Rejects malformed tokens, bad signatures, and anything past `exp`.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0; // expiry is a hard cutoff

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .context("Invalid or expired credential")?;

        Ok(decoded.claims)
    }
}
