mod credential;

pub use credential::CredentialService;
