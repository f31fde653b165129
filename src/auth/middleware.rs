//! Credential Verification Middleware
//! Mission: Gate protected routes behind bearer credential checks

use crate::auth::{
    api::{AuthError, AuthState},
    models::{AuthContext, Role},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

/// Verification gate applied to every protected route.
///
/// Extracts the bearer credential from the Authorization header, verifies
/// signature and expiry, resolves the embedded account id against the store,
/// and attaches an [`AuthContext`] for downstream handlers. Performs no
/// mutation.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(AuthError::MissingCredential)?;

    let claims = state
        .jwt_handler
        .verify(token)
        .map_err(|_| AuthError::InvalidCredential)?;

    let account_id =
        Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidCredential)?;

    // The credential may outlive the account
    let account = state
        .account_store
        .find_by_id(&account_id)
        .map_err(|e| {
            warn!("Account lookup failed during verification: {}", e);
            AuthError::InternalError
        })?
        .ok_or(AuthError::UnknownAccount)?;

    req.extensions_mut().insert(AuthContext {
        account_id: account.id,
        role: account.role,
    });

    Ok(next.run(req).await)
}

/// Role gate: exact match or `Forbidden`. Pure predicate.
pub fn require_role(ctx: &AuthContext, required: Role) -> Result<(), AuthError> {
    if ctx.role == required {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
