use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::error::Result;

pub type DbPool = Pool<Sqlite>;

/// Open a read-only pool on the observation database.
///
/// The export never writes to the store, so the connection is opened with
/// `mode=ro` and a single connection is enough for the batch run.
pub async fn connect(database_url: &str) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    info!(database_url, "database connection pool established");
    Ok(pool)
}
