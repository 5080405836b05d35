use crate::config::{AuthConfig, SeedPolicy};
use crate::db::Db;
use crate::db::repo::CredentialRepo;
use crate::error::{AuthError, AuthResult};
use crate::hashing::{CredentialHasher, hasher_for};
use crate::models::credential::{Credentials, VerifyResult};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Keeps the administrative account in line with configuration and answers
/// "does this username/password pair match?".
pub struct CredentialService {
    db: Arc<Db>,
    config: Arc<AuthConfig>,
    hasher: Arc<dyn CredentialHasher>,
    seeded: OnceCell<()>,
}

impl CredentialService {
    pub fn new(db: Arc<Db>, config: Arc<AuthConfig>) -> Self {
        let hasher = hasher_for(config.hash_scheme);
        Self::with_hasher(db, config, hasher)
    }

    pub fn with_hasher(db: Arc<Db>, config: Arc<AuthConfig>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self {
            db,
            config,
            hasher,
            seeded: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Creates the table if needed and upserts the admin record from the current
    /// configuration. Safe to call any number of times.
    pub async fn seed_admin(&self, repo: &dyn CredentialRepo) -> AuthResult<()> {
        repo.ensure_schema().await?;

        let hash = self.hasher.hash(self.config.admin_password.expose())?;
        repo.upsert(&self.config.admin_username, &hash).await?;

        tracing::debug!(username = %self.config.admin_username, "admin credential seeded");
        Ok(())
    }

    /// Opens the store once and seeds the admin account. Meant for process startup.
    pub async fn bootstrap(&self) -> AuthResult<()> {
        self.db
            .with_store(|store| async move {
                self.seed_admin(&store).await?;
                _ = self.seeded.set(());
                Ok::<_, AuthError>(())
            })
            .await?;

        tracing::info!(
            username = %self.config.admin_username,
            path = %self.db.path().display(),
            "credential store ready"
        );
        Ok(())
    }

    /// Checks a submitted pair. Empty input is rejected before the store is opened.
    pub async fn verify(&self, username: &str, password: &str) -> AuthResult<VerifyResult> {
        let creds = Credentials::new(username, password)?;

        self.db
            .with_store(|store| async move { self.verify_with(&store, &creds).await })
            .await
    }

    /// Same as [`CredentialService::verify`] but against an already opened store.
    pub async fn verify_with(&self, repo: &dyn CredentialRepo, creds: &Credentials) -> AuthResult<VerifyResult> {
        self.prepare(repo).await?;

        let Some(record) = repo.get_by_username(&creds.username).await? else {
            tracing::warn!(username = %creds.username, reason = "unknown user", "login failed");
            return Ok(VerifyResult::Invalid);
        };

        if !self.hasher.verify(creds.password.expose(), &record.password_hash)? {
            tracing::warn!(username = %creds.username, reason = "password mismatch", "login failed");
            return Ok(VerifyResult::Invalid);
        }

        tracing::info!(username = %record.username, "login succeeded");
        Ok(VerifyResult::Valid(record.username))
    }

    async fn prepare(&self, repo: &dyn CredentialRepo) -> AuthResult<()> {
        match self.config.seed_policy {
            SeedPolicy::EveryAttempt => self.seed_admin(repo).await,
            SeedPolicy::Once => {
                // the table may have been created by another process, or the file replaced
                repo.ensure_schema().await?;
                self.seeded.get_or_try_init(|| self.seed_admin(repo)).await?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbResult;
    use crate::hashing::Sha256Hasher;
    use crate::models::credential::Credential;
    use crate::sensitive::Sensitive;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRepo {
        rows: Mutex<BTreeMap<String, String>>,
        upserts: Mutex<u32>,
    }

    impl MemoryRepo {
        fn upserts(&self) -> u32 {
            *self.upserts.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl CredentialRepo for MemoryRepo {
        async fn ensure_schema(&self) -> DbResult<()> {
            Ok(())
        }

        async fn upsert(&self, username: &str, password_hash: &str) -> DbResult<()> {
            *self.upserts.lock().unwrap() += 1;
            self.rows
                .lock()
                .unwrap()
                .insert(username.to_string(), password_hash.to_string());
            Ok(())
        }

        async fn get_by_username(&self, username: &str) -> DbResult<Option<Credential>> {
            Ok(self.rows.lock().unwrap().get(username).map(|hash| Credential {
                id: 1,
                username: username.to_string(),
                password_hash: hash.clone(),
            }))
        }

        async fn count_by_username(&self, username: &str) -> DbResult<u64> {
            Ok(self.rows.lock().unwrap().contains_key(username) as u64)
        }
    }

    fn service(policy: SeedPolicy) -> CredentialService {
        service_at(Db::new("/tmp/never-opened-by-these-tests.db"), policy)
    }

    fn service_at(db: Db, policy: SeedPolicy) -> CredentialService {
        let config = AuthConfig {
            admin_username: "admin".into(),
            admin_password: Sensitive("xtract1234".into()),
            seed_policy: policy,
            ..AuthConfig::default()
        };
        CredentialService::with_hasher(
            Arc::new(db),
            Arc::new(config),
            Arc::new(Sha256Hasher),
        )
    }

    fn creds(user: &str, pass: &str) -> Credentials {
        Credentials::new(user, pass).unwrap()
    }

    #[tokio::test]
    async fn admin_matches_and_wrong_password_does_not() {
        let svc = service(SeedPolicy::EveryAttempt);
        let repo = MemoryRepo::default();

        let ok = svc.verify_with(&repo, &creds("admin", "xtract1234")).await.unwrap();
        assert_eq!(ok, VerifyResult::Valid("admin".into()));

        let bad = svc.verify_with(&repo, &creds("admin", "wrong")).await.unwrap();
        assert_eq!(bad, VerifyResult::Invalid);

        let unknown = svc.verify_with(&repo, &creds("nosuchuser", "whatever")).await.unwrap();
        assert_eq!(unknown, VerifyResult::Invalid);
    }

    #[tokio::test]
    async fn every_attempt_policy_reseeds_each_time() {
        let svc = service(SeedPolicy::EveryAttempt);
        let repo = MemoryRepo::default();

        for _ in 0..3 {
            svc.verify_with(&repo, &creds("someone", "else")).await.unwrap();
        }
        assert_eq!(repo.upserts(), 3);
    }

    #[tokio::test]
    async fn once_policy_seeds_a_single_time() {
        let svc = service(SeedPolicy::Once);
        let repo = MemoryRepo::default();

        for _ in 0..3 {
            let res = svc.verify_with(&repo, &creds("admin", "xtract1234")).await.unwrap();
            assert!(res.is_valid());
        }
        assert_eq!(repo.upserts(), 1);
    }

    #[tokio::test]
    async fn empty_input_never_opens_the_store() {
        // the store lives below a regular file, so any storage access would fail
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let svc = service_at(Db::new(blocker.join("auth.db")), SeedPolicy::EveryAttempt);

        for (user, pass) in [("", "anything"), ("admin", ""), ("  ", "  ")] {
            let err = svc.verify(user, pass).await.unwrap_err();
            assert!(matches!(err, AuthError::Validation { .. }), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn stored_hash_is_replaced_on_seed() {
        let svc = service(SeedPolicy::EveryAttempt);
        let repo = MemoryRepo::default();
        repo.upsert("admin", "stale").await.unwrap();

        svc.seed_admin(&repo).await.unwrap();

        let row = repo.get_by_username("admin").await.unwrap().unwrap();
        assert_eq!(row.password_hash, crate::hashing::sha256_hex(b"xtract1234"));
    }
}
