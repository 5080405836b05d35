use crate::config::HashScheme;
use crate::error::AuthResult;
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Turns a plaintext password into its stored form and checks candidates against it.
pub trait CredentialHasher: Send + Sync {
    fn scheme(&self) -> HashScheme;

    fn hash(&self, password: &str) -> AuthResult<String>;

    /// Returns false for a mismatch and for a stored value this hasher cannot read.
    fn verify(&self, password: &str, stored: &str) -> AuthResult<bool>;
}

pub fn hasher_for(scheme: HashScheme) -> Arc<dyn CredentialHasher> {
    match scheme {
        HashScheme::Sha256 => Arc::new(Sha256Hasher),
        HashScheme::Argon2 => Arc::new(Argon2Hasher::new()),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Unsalted sha256 over the raw password bytes, stored as lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn scheme(&self) -> HashScheme {
        HashScheme::Sha256
    }

    fn hash(&self, password: &str) -> AuthResult<String> {
        Ok(sha256_hex(password.as_bytes()))
    }

    fn verify(&self, password: &str, stored: &str) -> AuthResult<bool> {
        let computed = sha256_hex(password.as_bytes());
        Ok(computed.as_bytes().ct_eq(stored.as_bytes()).into())
    }
}

pub struct Argon2Hasher {
    argon: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            argon: Argon2::default(),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn scheme(&self) -> HashScheme {
        HashScheme::Argon2
    }

    fn hash(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self.argon.hash_password(password.as_bytes(), &salt)?.to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, stored: &str) -> AuthResult<bool> {
        let Ok(parsed) = PasswordHash::new(stored) else {
            tracing::warn!("stored credential is not a PHC string, treating as mismatch");
            return Ok(false);
        };
        Ok(self.argon.verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_is_deterministic_hex() {
        let a = Sha256Hasher.hash("xtract1234").unwrap();
        let b = Sha256Hasher.hash("xtract1234").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, Sha256Hasher.hash("xtract1235").unwrap());
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_verify() {
        let stored = Sha256Hasher.hash("hunter2").unwrap();
        assert!(Sha256Hasher.verify("hunter2", &stored).unwrap());
        assert!(!Sha256Hasher.verify("hunter3", &stored).unwrap());
        assert!(!Sha256Hasher.verify("hunter2", "").unwrap());
    }

    #[test]
    fn argon2_salts_and_verifies() {
        let hasher = Argon2Hasher::new();
        let a = hasher.hash("hunter2").unwrap();
        let b = hasher.hash("hunter2").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(hasher.verify("hunter2", &a).unwrap());
        assert!(hasher.verify("hunter2", &b).unwrap());
        assert!(!hasher.verify("hunter3", &a).unwrap());
    }

    #[test]
    fn argon2_rejects_legacy_digest() {
        let legacy = sha256_hex(b"hunter2");
        assert!(!Argon2Hasher::new().verify("hunter2", &legacy).unwrap());
    }

    #[test]
    fn hasher_for_matches_scheme() {
        assert_eq!(hasher_for(HashScheme::Sha256).scheme(), HashScheme::Sha256);
        assert_eq!(hasher_for(HashScheme::Argon2).scheme(), HashScheme::Argon2);
    }
}
