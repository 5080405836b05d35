use crate::db::error::DbError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Caller supplied an empty or otherwise unusable field
    #[error("validation failed: {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Request body could not be parsed
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Storage(#[from] DbError),

    #[error(transparent)]
    Hash(#[from] password_hash::Error),
}

impl AuthError {
    /// True when the caller can fix the input and retry. Everything else is an
    /// internal failure whose cause must stay out of responses.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthError::Validation { .. } | AuthError::InvalidPayload(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigErrorKind {
    #[error("failed to read file: {0}")]
    Read(std::io::Error),

    #[error("failed to parse file: {0}")]
    Parse(toml::de::Error),

    #[error("invalid environment variable {0}: {1}")]
    InvalidEnv(String, String),
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid configuration in {path}: {source}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: ConfigErrorKind,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
