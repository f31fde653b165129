//! Account Storage
//! Mission: Persist account records in SQLite with a unique username index

use crate::auth::models::{Account, Role};
use anyhow::{Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::info;
use uuid::Uuid;

/// Failure modes of account creation. The unique index on `username` is the
/// authoritative duplicate guard; the pre-check in the handler is only an
/// optimization.
#[derive(Debug)]
pub enum CreateAccountError {
    UsernameTaken,
    Store(anyhow::Error),
}

impl std::fmt::Display for CreateAccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateAccountError::UsernameTaken => write!(f, "Username already taken"),
            CreateAccountError::Store(e) => write!(f, "Account store error: {}", e),
        }
    }
}

impl std::error::Error for CreateAccountError {}

/// Failure modes of a password change.
#[derive(Debug)]
pub enum ChangePasswordError {
    AccountNotFound,
    InvalidCurrentPassword,
    Store(anyhow::Error),
}

impl std::fmt::Display for ChangePasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangePasswordError::AccountNotFound => write!(f, "Account not found"),
            ChangePasswordError::InvalidCurrentPassword => {
                write!(f, "Invalid current password")
            }
            ChangePasswordError::Store(e) => write!(f, "Account store error: {}", e),
        }
    }
}

impl std::error::Error for ChangePasswordError {}

/// Account storage with SQLite backend
pub struct AccountStore {
    db_path: String,
}

impl AccountStore {
    /// Create a new account store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
        let id_str: String = row.get(0)?;
        let role_str: String = row.get(3)?;
        Ok(Account {
            id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
            username: row.get(1)?,
            password_hash: row.get(2)?,
            role: Role::from_str(&role_str).unwrap_or_default(),
            created_at: row.get(4)?,
        })
    }

    /// Get account by username (exact match on the unique index)
    pub fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, role, created_at
             FROM accounts WHERE username = ?1",
        )?;

        let account = stmt.query_row(params![username], Self::account_from_row);

        match account {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get account by id
    pub fn find_by_id(&self, id: &Uuid) -> Result<Option<Account>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, role, created_at
             FROM accounts WHERE id = ?1",
        )?;

        let account = stmt.query_row(params![id.to_string()], Self::account_from_row);

        match account {
            Ok(account) => Ok(Some(account)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new account with a bcrypt-hashed password.
    ///
    /// A duplicate username is reported as `UsernameTaken` whether it was
    /// caught here or by the unique index at insert time.
    pub fn create_account(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> std::result::Result<Account, CreateAccountError> {
        let password_hash = hash(password, DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(CreateAccountError::Store)?;

        let account = Account {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            role,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)
            .context("Failed to open account store")
            .map_err(CreateAccountError::Store)?;

        let inserted = conn.execute(
            "INSERT INTO accounts (id, username, password_hash, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                account.id.to_string(),
                account.username,
                account.password_hash,
                account.role.as_str(),
                account.created_at,
            ],
        );

        if let Err(e) = inserted {
            if let rusqlite::Error::SqliteFailure(err, _) = &e {
                if err.code == ErrorCode::ConstraintViolation {
                    return Err(CreateAccountError::UsernameTaken);
                }
            }
            return Err(CreateAccountError::Store(
                anyhow::Error::new(e).context("Failed to insert account"),
            ));
        }

        info!(
            username = %account.username,
            role = account.role.as_str(),
            "Account created"
        );

        Ok(account)
    }

    /// Verify a username/password pair. Returns the account on success and
    /// `None` for both an unknown username and a wrong password, so callers
    /// cannot distinguish the two.
    pub fn verify_login(&self, username: &str, password: &str) -> Result<Option<Account>> {
        match self.find_by_username(username)? {
            Some(account) => {
                let valid = verify(password, &account.password_hash)
                    .context("Failed to verify password")?;
                Ok(valid.then_some(account))
            }
            None => Ok(None),
        }
    }

    /// Replace the stored password hash after verifying the current password.
    /// Single-row update, touches nothing but `password_hash`.
    pub fn change_password(
        &self,
        id: &Uuid,
        current_password: &str,
        new_password: &str,
    ) -> std::result::Result<(), ChangePasswordError> {
        let account = self
            .find_by_id(id)
            .map_err(ChangePasswordError::Store)?
            .ok_or(ChangePasswordError::AccountNotFound)?;

        let valid = verify(current_password, &account.password_hash)
            .context("Failed to verify password")
            .map_err(ChangePasswordError::Store)?;
        if !valid {
            return Err(ChangePasswordError::InvalidCurrentPassword);
        }

        let new_hash = hash(new_password, DEFAULT_COST)
            .context("Failed to hash password")
            .map_err(ChangePasswordError::Store)?;

        let conn = Connection::open(&self.db_path)
            .context("Failed to open account store")
            .map_err(ChangePasswordError::Store)?;

        let rows = conn
            .execute(
                "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
                params![new_hash, id.to_string()],
            )
            .context("Failed to update password hash")
            .map_err(ChangePasswordError::Store)?;

        if rows == 0 {
            // Deleted between the read and the write
            return Err(ChangePasswordError::AccountNotFound);
        }

        info!(account_id = %id, "Password changed");
        Ok(())
    }

    /// List all accounts (admin only)
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, password_hash, role, created_at
             FROM accounts ORDER BY created_at",
        )?;

        let accounts = stmt
            .query_map([], Self::account_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }
}
