use crate::db::error::DbError;
use crate::db::repo::CredentialRepository;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_rusqlite::Connection;

pub mod error;
pub mod repo;

pub type DbResult<T> = Result<T, DbError>;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Location of the credential store. Holds no open handle; every unit of work
/// opens its own connection through [`Db::with_store`].
#[derive(Clone, Debug)]
pub struct Db {
    path: PathBuf,
}

impl Db {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the directory that will hold the store file, if it is missing.
    pub fn ensure_storage_ready(&self) -> DbResult<()> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.is_dir() {
            return Ok(());
        }

        tracing::debug!(dir = %parent.display(), "creating storage directory");
        std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })
    }

    /// Opens (and creates, if absent) the store. The caller owns the handle and
    /// must close it; prefer [`Db::with_store`].
    pub async fn open_store(&self) -> DbResult<CredentialRepository> {
        self.ensure_storage_ready()?;

        let conn = Connection::open(&self.path).await?;
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            Ok(())
        })
        .await?;

        Ok(CredentialRepository::new(conn))
    }

    /// Runs `f` against a freshly opened store and closes the store afterwards,
    /// whether `f` succeeded or not.
    pub async fn with_store<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(CredentialRepository) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<DbError>,
    {
        let store = self.open_store().await?;
        let result = f(store.clone()).await;

        if let Err(e) = store.close().await {
            tracing::warn!(error = %e, path = %self.path.display(), "closing credential store failed");
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repo::CredentialRepo;

    #[test]
    fn ensure_storage_ready_creates_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(dir.path().join("a/b/c/auth.db"));

        db.ensure_storage_ready().unwrap();
        assert!(dir.path().join("a/b/c").is_dir());

        // second call is a no-op
        db.ensure_storage_ready().unwrap();
    }

    #[test]
    fn ensure_storage_ready_reports_unwritable_parent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let db = Db::new(blocker.join("sub/auth.db"));
        let err = db.ensure_storage_ready().unwrap_err();
        assert!(matches!(err, DbError::CreateDir { .. }));
    }

    #[test]
    fn bare_file_name_needs_no_directory() {
        Db::new("auth.db").ensure_storage_ready().unwrap();
    }

    #[tokio::test]
    async fn open_store_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/auth.db");
        let db = Db::new(&path);

        let store = db.open_store().await.unwrap();
        store.ensure_schema().await.unwrap();
        store.close().await.unwrap();

        assert!(path.is_file());
    }

    #[tokio::test]
    async fn with_store_propagates_closure_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = Db::new(dir.path().join("auth.db"));

        let res: DbResult<()> = db
            .with_store(|_store| async { Err(DbError::Decode("boom".into())) })
            .await;
        assert!(matches!(res, Err(DbError::Decode(_))));

        // the store is usable again afterwards
        let n = db
            .with_store(|store| async move {
                store.ensure_schema().await?;
                store.count_by_username("admin").await
            })
            .await
            .unwrap();
        assert_eq!(n, 0);
    }
}
