pub mod polls;
pub mod posts;
pub mod users;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

pub type DbPool = sqlx::SqlitePool;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
}

impl DbError {
    /// Translate constraint violations into domain errors; everything else stays `Sqlx`.
    pub(crate) fn from_constraint(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DbError::AlreadyExists;
            }
            if db_err.is_foreign_key_violation() {
                return DbError::NotFound;
            }
        }
        DbError::Sqlx(err)
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations: applied successfully");
    Ok(())
}

/// In-memory pool with the schema applied. One connection, since every
/// `sqlite::memory:` connection is its own database.
pub async fn memory_pool() -> Result<DbPool, sqlx::Error> {
    let pool = create_pool("sqlite::memory:", 1).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
