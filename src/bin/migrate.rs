use anyhow::{Context, Result};
use bridge_ledger::repository::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    dotenv::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must point at the snapshot file")?;

    info!("Creating snapshot schema in {}", database_url);

    let _db = Database::new(&database_url)?;

    info!("Snapshot schema ready");

    Ok(())
}
