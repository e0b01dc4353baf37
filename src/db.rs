pub mod calendar_repository;
pub mod error;
pub mod models;

pub use calendar_repository::CalendarRepository;
pub use error::DbError;
pub use models::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Open the SQLite pool, creating the database file if needed, and run pending migrations
///
/// `sqlite::memory:` gives each connection its own database, so in-memory pools should use a
/// single connection.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    info!("Database connection established");

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations completed");

    Ok(pool)
}
