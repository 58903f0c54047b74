//! Schema bootstrap for the users table
//!
//! Idempotent: every statement is `IF NOT EXISTS`. `from` and `settings`
//! are nullable because inserts only supply `name`, `last_name` and `age`.

use usergate_core::Backend;

use crate::db::Store;
use crate::error::StoreResult;

const PG_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        "from" TEXT,
        age BIGINT NOT NULL,
        settings TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",
    "CREATE INDEX IF NOT EXISTS idx_users_age ON users(age)",
];

// MySQL has no CREATE INDEX IF NOT EXISTS, so indexes are declared inline.
const MYSQL_SCHEMA: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        last_name VARCHAR(255) NOT NULL,
        `from` VARCHAR(255) NULL,
        age BIGINT NOT NULL,
        settings TEXT NULL,
        INDEX idx_users_name (name),
        INDEX idx_users_age (age)
    )
    "#];

const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        "from" TEXT,
        age INTEGER NOT NULL,
        settings TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users(name)",
    "CREATE INDEX IF NOT EXISTS idx_users_age ON users(age)",
];

fn schema(backend: Backend) -> &'static [&'static str] {
    match backend {
        Backend::PostgreSQL => PG_SCHEMA,
        Backend::MySQL => MYSQL_SCHEMA,
        Backend::SQLite => SQLITE_SCHEMA,
    }
}

/// Create the users table and its indexes.
pub async fn run(store: &Store) -> StoreResult<()> {
    tracing::info!(backend = ?store.backend(), "running user store migrations");

    for statement in schema(store.backend()) {
        sqlx::query(statement).execute(store.pool()).await?;
    }

    tracing::info!("user store migrations complete");
    Ok(())
}
