mod credential;
mod credential_db;

pub use credential::CredentialRepo;
pub use credential_db::CredentialRepository;
