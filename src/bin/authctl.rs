use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use xtract_auth::config::{Config, HashScheme};
use xtract_auth::db::Db;
use xtract_auth::db::repo::CredentialRepo;
use xtract_auth::hashing::hasher_for;
use xtract_auth::{AuthError, CredentialService, VerifyResult};

// cargo run --bin authctl -- seed
// echo 'xtract1234' | cargo run --bin authctl -- verify --username admin

#[derive(Debug, Parser)]
#[command(name = "authctl", version, about = "Inspect and maintain the credential store")]
struct Args {
    /// Read configuration from this TOML file instead of the environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the store location (AUTH_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the administrative account from the current configuration
    Seed,
    /// Check a username/password pair. Exits 0 when valid, 1 when not, 2 on bad input
    Verify {
        #[arg(long)]
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Print the stored form of a password
    Hash {
        password: String,
        /// Scheme to use instead of the configured one
        #[arg(long)]
        scheme: Option<HashScheme>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(path) = args.db_path {
        cfg.auth.db_path = path;
    }

    let db = Arc::new(Db::new(cfg.auth.db_path.clone()));
    let service = CredentialService::new(db.clone(), Arc::new(cfg.auth.clone()));

    match args.command {
        Command::Seed => {
            service.bootstrap().await.context("seeding the admin account failed")?;
            let admin = service.config().admin_username.clone();
            let count = db
                .with_store(|store| async move { store.count_by_username(&admin).await })
                .await?;
            println!("admin account '{}' seeded ({count} record) in {}", service.config().admin_username, db.path().display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password_line()?,
            };

            match service.verify(&username, &password).await {
                Ok(VerifyResult::Valid(user)) => {
                    println!("valid: {user}");
                    Ok(ExitCode::SUCCESS)
                }
                Ok(VerifyResult::Invalid) => {
                    println!("invalid credentials");
                    Ok(ExitCode::from(1))
                }
                Err(e @ AuthError::Validation { .. }) => {
                    eprintln!("{e}");
                    Ok(ExitCode::from(2))
                }
                Err(e) => Err(e).context("verification failed"),
            }
        }
        Command::Hash { password, scheme } => {
            let hasher = hasher_for(scheme.unwrap_or(cfg.auth.hash_scheme));
            println!("{}", hasher.hash(&password)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_password_line() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("cannot read password from stdin")?;
    Ok(line)
}
