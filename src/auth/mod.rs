//! Identity & Access Module
//! Mission: Credential issuance, verification, and role-gated access

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};

pub mod account_store;
pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use account_store::AccountStore;
pub use api::{AuthError, AuthState};
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, require_role};

/// Assemble the identity routes: public register/login plus the protected
/// surface behind the verification middleware.
pub fn router(state: AuthState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(api::register))
        .route("/api/auth/login", post(api::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/me", get(api::me))
        .route("/api/auth/logout", post(api::logout))
        .route("/api/users/change-password", put(api::change_password))
        .route("/api/admin/accounts", get(api::list_accounts))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    public.merge(protected)
}
