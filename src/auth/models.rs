//! Identity Models
//! Mission: Define account and credential data structures

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored account record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
    pub created_at: String,
}

/// Account roles for authorization gates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "User")]
    User, // Regular reader account
    #[serde(rename = "Creator")]
    Creator, // Content creator account
    #[serde(rename = "Admin")]
    Admin, // Full access, gates announcement mutation
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "User",
            Role::Creator => "Creator",
            Role::Admin => "Admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "User" => Some(Role::User),
            "Creator" => Some(Role::Creator),
            "Admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// JWT claims payload. Role is deliberately absent: protected requests
/// re-resolve the account so role changes and deletions apply immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub iat: usize,  // issued-at timestamp
    pub exp: usize,  // expiration timestamp
}

/// Authenticated identity attached to a request by the verification
/// middleware. The one and only identity context handlers may consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: Uuid,
    pub role: Role,
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Password change request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Issued bearer credential
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub token: String,
    pub expires_in: usize, // seconds until expiration
}

/// Register/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub credential: CredentialResponse,
    pub account: AccountResponse,
}

/// Account projection (sanitized, never carries the password hash)
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl AccountResponse {
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            role: account.role,
            created_at: account.created_at.clone(),
        }
    }
}
