//! Postgres persistence for product compositions and their edit history.
//!
//! - [`models`]: row structs and DTOs.
//! - [`repositories`]: zero-sized repos with one async method per query.
//! - [`editor`]: the edit operations, each one history-recorded transaction.
//! - [`history`]: change-set recording, branch discard, undo and redo.
//! - [`tree_reader`]: loads and materializes a product tree.

use sqlx::postgres::PgPoolOptions;

use partlist_core::error::CoreError;

pub mod editor;
pub mod history;
pub mod models;
pub mod repositories;
pub mod tree_reader;

pub type DbPool = sqlx::PgPool;

/// Default size of the connection pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verify the database answers a trivial query.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Failure of an edit, undo or redo.
///
/// Domain failures carry a [`CoreError`]; storage failures carry the raw
/// `sqlx` error. Either way the transaction that produced it has been
/// rolled back.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type EditResult<T> = Result<T, EditError>;
