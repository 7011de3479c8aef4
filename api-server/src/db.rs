//! Database pool, startup probe and schema migrations.

use std::future::Future;
use std::time::Duration;

use rocket::figment::Figment;
use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use rocket_db_pools::sqlx::{self, PgPool, migrate::Migrator};

/// Attempts made to reach the database before launch is aborted.
pub const STARTUP_CONNECT_ATTEMPTS: u32 = 5;
/// Fixed pause between startup attempts.
pub const STARTUP_RETRY_DELAY: Duration = Duration::from_secs(2);

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Figment key under `databases` holding the pool settings.
pub const DATABASE_NAME: &str = "bragboard_db";

/// Pool settings from `databases.bragboard_db`, with defaults for the
/// optional knobs.
pub fn pool_config(figment: &Figment) -> Result<rocket_db_pools::Config, rocket::figment::Error> {
    figment
        .focus(&format!("databases.{DATABASE_NAME}"))
        .join(("max_connections", 10))
        .join(("connect_timeout", 5))
        .extract()
}

/// Build the pool without opening a connection, so the startup probe below
/// owns the first connect and its retries.
pub fn lazy_pool(config: &rocket_db_pools::Config) -> Result<PgPool, sqlx::Error> {
    let options: PgConnectOptions = config.url.parse()?;
    let mut pool = PgPoolOptions::new()
        .max_connections(config.max_connections as u32)
        .acquire_timeout(Duration::from_secs(config.connect_timeout));
    if let Some(idle) = config.idle_timeout {
        pool = pool.idle_timeout(Duration::from_secs(idle));
    }
    Ok(pool.connect_lazy_with(options))
}

/// Run `op` up to `attempts` times with a fixed `delay` between tries,
/// returning the first success or the last error.
pub async fn retry_fixed<T, E, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < attempts => {
                log::warn!(
                    "attempt {attempt}/{attempts} failed: {err}; retrying in {}s",
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                log::error!("attempt {attempt}/{attempts} failed: {err}; giving up");
                return Err(err);
            }
        }
    }
}

/// Confirm the database answers, then bring the schema up to date.
pub async fn prepare_database(pool: &PgPool) -> Result<(), sqlx::Error> {
    prepare_database_with(pool, STARTUP_CONNECT_ATTEMPTS, STARTUP_RETRY_DELAY).await
}

pub async fn prepare_database_with(
    pool: &PgPool,
    attempts: u32,
    delay: Duration,
) -> Result<(), sqlx::Error> {
    retry_fixed(attempts, delay, |attempt| async move {
        log::info!("probing database connectivity (attempt {attempt})");
        sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
    })
    .await?;

    run_migrations(pool).await
}

/// Apply pending migrations. Idempotent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    log::info!("checking database migration state");
    MIGRATOR.run(pool).await?;
    log::info!("database migrations up to date");
    Ok(())
}
