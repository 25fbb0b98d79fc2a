pub mod account_repository;
pub mod member_repository;
pub mod message_repository;
pub mod room_repository;

pub use account_repository::AccountRepository;
pub use member_repository::MemberRepository;
pub use message_repository::MessageRepository;
pub use room_repository::RoomRepository;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Create a SQLite connection pool
pub async fn create_pool(config: &Config) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| AppError::Database(format!("Invalid DATABASE_URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Private in-memory database. A single connection that never expires,
/// since every new connection would open an empty database.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Check database connection health
pub async fn health_check(pool: &SqlitePool) -> Result<bool> {
    let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    Ok(one == 1)
}

/// Unique-constraint violation on the given `table.column`, if that is what failed.
pub(crate) fn violates_unique(err: &sqlx::Error, column: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains(column)
        }
        _ => false,
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = create_memory_pool().await.expect("Should open in-memory db");
    run_migrations(&pool).await.expect("Should migrate");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check_on_fresh_db() {
        let pool = test_pool().await;
        assert!(health_check(&pool).await.expect("Should query"));
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = test_pool().await;
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .expect("Should read pragma");
        assert_eq!(enabled, 1);
    }
}
