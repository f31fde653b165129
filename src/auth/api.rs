//! Identity API Endpoints
//! Mission: Registration, login, and account credential management

use crate::auth::{
    account_store::{AccountStore, ChangePasswordError, CreateAccountError},
    jwt::JwtHandler,
    middleware::require_role,
    models::{
        Account, AccountResponse, AuthContext, AuthResponse, ChangePasswordRequest,
        CredentialResponse, LoginRequest, RegisterRequest, Role,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared identity state
#[derive(Clone)]
pub struct AuthState {
    pub account_store: Arc<AccountStore>,
    pub jwt_handler: Arc<JwtHandler>,
}

impl AuthState {
    pub fn new(account_store: Arc<AccountStore>, jwt_handler: Arc<JwtHandler>) -> Self {
        Self {
            account_store,
            jwt_handler,
        }
    }
}

/// Identity error taxonomy. Every failure the component can produce maps to
/// exactly one variant, one HTTP status, and one stable machine-checkable
/// `error` kind in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidUsername,
    InvalidRole,
    UsernameTaken,
    InvalidCredentials,
    MissingCredential,
    InvalidCredential,
    UnknownAccount,
    Forbidden,
    AccountNotFound,
    InternalError,
}

impl AuthError {
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidUsername => "invalid_username",
            AuthError::InvalidRole => "invalid_role",
            AuthError::UsernameTaken => "username_taken",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::MissingCredential => "missing_credential",
            AuthError::InvalidCredential => "invalid_credential",
            AuthError::UnknownAccount => "unknown_account",
            AuthError::Forbidden => "forbidden",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::InternalError => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidUsername | AuthError::InvalidRole | AuthError::UsernameTaken => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials
            | AuthError::MissingCredential
            | AuthError::InvalidCredential
            | AuthError::UnknownAccount => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            AuthError::InvalidUsername => {
                "Invalid username. Username must be 3-20 characters long and can only \
                 contain letters, numbers, underscores, and hyphens."
            }
            AuthError::InvalidRole => "Role must be one of User, Creator, Admin",
            AuthError::UsernameTaken => "Username already taken",
            // One message for unknown username and wrong password alike
            AuthError::InvalidCredentials => "Incorrect username or password",
            AuthError::MissingCredential => "Missing authorization credential",
            AuthError::InvalidCredential => "Invalid or expired credential",
            AuthError::UnknownAccount => "Account no longer exists",
            AuthError::Forbidden => "Insufficient permissions",
            AuthError::AccountNotFound => "Account not found",
            AuthError::InternalError => "Internal server error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.kind(),
            "message": self.message(),
        }));
        (self.status(), body).into_response()
    }
}

/// Username policy: 3-20 characters from [A-Za-z0-9_-]
fn valid_username(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn issue_credential(state: &AuthState, account: &Account) -> Result<AuthResponse, AuthError> {
    let (token, expires_in) = state.jwt_handler.issue(&account.id).map_err(|e| {
        warn!("Failed to issue credential: {}", e);
        AuthError::InternalError
    })?;

    Ok(AuthResponse {
        credential: CredentialResponse { token, expires_in },
        account: AccountResponse::from_account(account),
    })
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    if !valid_username(&payload.username) {
        return Err(AuthError::InvalidUsername);
    }

    // Unrecognized roles are rejected, not coerced to User
    let role = match payload.role.as_deref() {
        None => Role::default(),
        Some(s) => Role::from_str(s).ok_or(AuthError::InvalidRole)?,
    };

    // Pre-check is advisory; the unique index decides the race
    let existing = state
        .account_store
        .find_by_username(&payload.username)
        .map_err(|e| {
            warn!("Account lookup failed: {}", e);
            AuthError::InternalError
        })?;
    if existing.is_some() {
        return Err(AuthError::UsernameTaken);
    }

    let account = state
        .account_store
        .create_account(&payload.username, &payload.password, role)
        .map_err(|e| match e {
            CreateAccountError::UsernameTaken => AuthError::UsernameTaken,
            CreateAccountError::Store(e) => {
                warn!("Failed to create account: {}", e);
                AuthError::InternalError
            }
        })?;

    info!(username = %account.username, role = account.role.as_str(), "Registration successful");

    let response = issue_credential(&state, &account)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let account = state
        .account_store
        .verify_login(&payload.username, &payload.password)
        .map_err(|e| {
            warn!("Login verification failed: {}", e);
            AuthError::InternalError
        })?
        .ok_or_else(|| {
            warn!(username = %payload.username, "Failed login attempt");
            AuthError::InvalidCredentials
        })?;

    info!(username = %account.username, "Login successful");

    let response = issue_credential(&state, &account)?;
    Ok(Json(response))
}

/// Current account - GET /api/auth/me (protected)
///
/// Returns a fresh projection from the store rather than echoing token
/// contents, so profile reads always reflect the stored record.
pub async fn me(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<AccountResponse>, AuthError> {
    let account = state
        .account_store
        .find_by_id(&ctx.account_id)
        .map_err(|e| {
            warn!("Account lookup failed: {}", e);
            AuthError::InternalError
        })?
        .ok_or(AuthError::UnknownAccount)?;

    Ok(Json(AccountResponse::from_account(&account)))
}

/// Logout - POST /api/auth/logout (protected)
///
/// Credentials are stateless; the server holds nothing to invalidate. This
/// acknowledges the client-side token discard and remains valid until the
/// token's natural expiry.
pub async fn logout(Extension(ctx): Extension<AuthContext>) -> Json<serde_json::Value> {
    info!(account_id = %ctx.account_id, "Logout acknowledged");
    Json(json!({}))
}

/// Change password - PUT /api/users/change-password (protected)
pub async fn change_password(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    state
        .account_store
        .change_password(
            &ctx.account_id,
            &payload.current_password,
            &payload.new_password,
        )
        .map_err(|e| match e {
            ChangePasswordError::AccountNotFound => AuthError::AccountNotFound,
            ChangePasswordError::InvalidCurrentPassword => AuthError::InvalidCredentials,
            ChangePasswordError::Store(e) => {
                warn!("Password change failed: {}", e);
                AuthError::InternalError
            }
        })?;

    Ok(Json(json!({})))
}

/// List accounts - GET /api/admin/accounts (protected, Admin only)
pub async fn list_accounts(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<AccountResponse>>, AuthError> {
    require_role(&ctx, Role::Admin)?;

    let accounts = state.account_store.list_accounts().map_err(|e| {
        warn!("Account listing failed: {}", e);
        AuthError::InternalError
    })?;

    let response: Vec<AccountResponse> =
        accounts.iter().map(AccountResponse::from_account).collect();

    Ok(Json(response))
}
