use crate::db::DbResult;
use crate::models::credential::Credential;

#[async_trait::async_trait]
pub trait CredentialRepo: Send + Sync {
    /// Creates the `users` table if it does not exist yet
    async fn ensure_schema(&self) -> DbResult<()>;
    /// Inserts the record, or replaces the hash of an existing record with the same username
    async fn upsert(&self, username: &str, password_hash: &str) -> DbResult<()>;
    /// Exact-match lookup by username
    async fn get_by_username(&self, username: &str) -> DbResult<Option<Credential>>;
    /// Number of records stored under this username (0 or 1)
    async fn count_by_username(&self, username: &str) -> DbResult<u64>;
}
