pub mod config;
pub mod db;
pub mod error;
pub mod hashing;
pub mod models;
pub mod net;
pub mod sensitive;
pub mod services;

// Convenient re-exports (so call sites can do `xtract_auth::CredentialService`, etc.)
pub use error::{AuthError, AuthResult};
pub use models::credential::{Credentials, VerifyResult};
pub use services::CredentialService;
