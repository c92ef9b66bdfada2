//! Database connection management

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

/// Connect to `SQLite`, creating the database file when missing.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the connection cannot be
/// established.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new().connect_with(options).await
}

/// Apply the embedded schema. Statements are idempotent, so running this
/// against an already-migrated database is safe.
///
/// # Errors
///
/// Returns an error when a schema statement fails.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
    Ok(())
}
