use crate::db::error::DbError;
use crate::db::repo::CredentialRepo;
use crate::db::DbResult;
use crate::models::credential::Credential;
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;

/// SQLite-backed credential table, bound to one open connection.
#[derive(Clone)]
pub struct CredentialRepository {
    conn: Connection,
}

impl CredentialRepository {
    pub(crate) fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub async fn close(self) -> DbResult<()> {
        self.conn.close().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialRepo for CredentialRepository {
    async fn ensure_schema(&self) -> DbResult<()> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    r#"
                    CREATE TABLE IF NOT EXISTS users (
                        id            INTEGER PRIMARY KEY AUTOINCREMENT,
                        username      TEXT UNIQUE NOT NULL,
                        password_hash TEXT NOT NULL
                    );
                    "#,
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn upsert(&self, username: &str, password_hash: &str) -> DbResult<()> {
        let username = username.to_string();
        let password_hash = password_hash.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO users (username, password_hash)
                    VALUES (?1, ?2)
                    ON CONFLICT (username)
                    DO UPDATE SET password_hash = excluded.password_hash
                    "#,
                    params![username, password_hash],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<Credential>> {
        let username = username.to_string();

        let row = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(
                    "SELECT id, username, password_hash FROM users WHERE username = ?1 LIMIT 1",
                )?;
                let found = stmt.query_row(params![username], Credential::try_from_row).optional()?;
                Ok(found)
            })
            .await?;

        Ok(row)
    }

    async fn count_by_username(&self, username: &str) -> DbResult<u64> {
        let username = username.to_string();

        let count: i64 = self
            .conn
            .call(move |conn| {
                let count = conn.query_row(
                    "SELECT COUNT(*) FROM users WHERE username = ?1",
                    params![username],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;

        u64::try_from(count).map_err(|_| DbError::Decode("negative row count".into()))
    }
}
