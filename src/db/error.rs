use std::path::PathBuf;
use thiserror::Error;

// DbError is the lowest level error type, wrapping errors from the storage layer. It does not wrap
// any higher level errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The directory holding the store could not be created
    #[error("cannot create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening, closing or talking to the connection thread failed
    #[error(transparent)]
    Conn(#[from] tokio_rusqlite::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("row decode error: {0}")]
    Decode(String),
}
