use crate::error::{AuthError, AuthResult};
use crate::sensitive::Sensitive;
use rusqlite::Row;

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Surrogate key
    pub id: i64,
    /// Username (distinct)
    pub username: String,
    /// Stored password digest, format depends on the hash scheme
    pub password_hash: String,
}

impl Credential {
    pub fn try_from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
        })
    }
}

/// A submitted username/password pair, trimmed and checked for emptiness.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Sensitive<String>,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> AuthResult<Self> {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() {
            return Err(AuthError::Validation {
                field: "username",
                message: "cannot be empty".into(),
            });
        }
        if password.is_empty() {
            return Err(AuthError::Validation {
                field: "password",
                message: "cannot be empty".into(),
            });
        }

        Ok(Self {
            username: username.to_string(),
            password: Sensitive(password.to_string()),
        })
    }
}

/// Outcome of a credential check. `Invalid` deliberately covers both an unknown
/// user and a wrong password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid(String),
    Invalid,
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid(_))
    }
}
