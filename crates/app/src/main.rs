use std::time::Duration;

use chrono::Utc;
use engine::Engine;
use migration::{Migrator, MigratorTrait};
use settings::Database;

use crate::error::AppError;

mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new().map_err(AppError::from)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledger={level},engine={level},migration={level}",
            level = settings.app.level
        ))
        .try_init()
        .map_err(|err| AppError::Logging(err.to_string()))?;

    let db = parse_database(&settings.database).await?;
    let engine = Engine::builder().database(db).build().await?;
    tracing::info!(database = ?settings.database, "ledger ready");

    if !settings.sweep.enabled {
        tracing::info!("settle sweep disabled, nothing else to run");
        return Ok(());
    }

    let period = Duration::from_secs(settings.sweep.interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = sweep(&engine).await {
                    tracing::error!("settle sweep failed: {err}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Mark as paid every pending transaction due before today.
async fn sweep(engine: &Engine) -> Result<u64, AppError> {
    let today = Utc::now().date_naive();
    let changed = engine.settle_all_before(today).await?;
    tracing::info!(%today, changed, "settle sweep done");
    Ok(changed)
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection, AppError> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
