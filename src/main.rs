use std::net::SocketAddr;
use std::sync::Arc;
use xtract_auth::{
    CredentialService, config,
    db::Db,
    net::http::{self, HttpAppCtx},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cfg = config::Config::from_env()?;
    if cfg.auth.uses_default_password() {
        tracing::warn!("AUTH_ADMIN_PASS is not set, the admin account uses the built-in placeholder password");
    }

    let db = Arc::new(Db::new(cfg.auth.db_path.clone()));
    let credentials = Arc::new(CredentialService::new(db, Arc::new(cfg.auth.clone())));

    // Seeding here only surfaces storage problems early; verification seeds as configured.
    if let Err(e) = credentials.bootstrap().await {
        tracing::error!(error = %e, "initial seeding of the credential store failed");
    }

    let addr: SocketAddr = cfg.http_addr.parse()?;
    http::serve(addr, HttpAppCtx::new(credentials)).await?;

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!("cannot install error reporter: {e}"))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}
