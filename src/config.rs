use crate::error::{ConfigErrorKind, InfraError};
use crate::sensitive::Sensitive;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_ADMIN_USER: &str = "admin";
/// Placeholder only. Every real deployment must override it.
pub const DEFAULT_ADMIN_PASS: &str = "xtract1234";
pub const DEFAULT_DB_PATH: &str = "/tmp/auth.db";
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// Unsalted hex sha256, readable by stores written by the web scaffold
    #[default]
    Sha256,
    /// Salted argon2 PHC strings
    Argon2,
}

impl FromStr for HashScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashScheme::Sha256),
            "argon2" => Ok(HashScheme::Argon2),
            other => Err(format!("unknown hash scheme '{other}' (expected sha256 or argon2)")),
        }
    }
}

/// When the administrative record gets (re)written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeedPolicy {
    /// Upsert on every verification, so rotated credentials apply without a restart
    #[default]
    EveryAttempt,
    /// Upsert once per process, on startup or first use
    Once,
}

impl FromStr for SeedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every-attempt" | "every_attempt" | "always" => Ok(SeedPolicy::EveryAttempt),
            "once" | "startup" => Ok(SeedPolicy::Once),
            other => Err(format!("unknown seed policy '{other}' (expected every-attempt or once)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: Sensitive<String>,
    pub db_path: PathBuf,
    pub hash_scheme: HashScheme,
    pub seed_policy: SeedPolicy,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: DEFAULT_ADMIN_USER.to_string(),
            admin_password: Sensitive(DEFAULT_ADMIN_PASS.to_string()),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            hash_scheme: HashScheme::default(),
            seed_policy: SeedPolicy::default(),
        }
    }
}

impl AuthConfig {
    pub fn uses_default_password(&self) -> bool {
        self.admin_password.expose() == DEFAULT_ADMIN_PASS
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listen address, e.g. "0.0.0.0:3000"
    pub http_addr: String,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InfraError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Read(e),
        })?;
        toml::from_str(&data).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Parse(e),
        })
    }

    pub fn from_env() -> Result<Self, InfraError> {
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InfraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AuthConfig::default();

        let auth = AuthConfig {
            admin_username: lookup("AUTH_ADMIN_USER").unwrap_or(defaults.admin_username),
            admin_password: lookup("AUTH_ADMIN_PASS").map(Sensitive).unwrap_or(defaults.admin_password),
            db_path: lookup("AUTH_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            hash_scheme: parse_env(&lookup, "AUTH_HASH_SCHEME")?.unwrap_or(defaults.hash_scheme),
            seed_policy: parse_env(&lookup, "AUTH_SEED_POLICY")?.unwrap_or(defaults.seed_policy),
        };

        Ok(Self {
            http_addr: lookup("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()),
            auth,
        })
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>, InfraError>
where
    T: FromStr<Err = String>,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.parse::<T>().map(Some).map_err(|msg| InfraError::Config {
            path: PathBuf::from("<env>"),
            source: ConfigErrorKind::InvalidEnv(key.to_string(), msg),
        }),
    }
}
