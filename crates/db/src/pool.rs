//! SQLite connection pool and schema bootstrap.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::DbError;

/// Type alias for the shared SQLite pool used across the whole application.
pub type DbPool = SqlitePool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS news (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT    NOT NULL,
        description TEXT    NOT NULL DEFAULT '',
        assets      TEXT    NOT NULL DEFAULT '[]',
        language    TEXT    NOT NULL,
        published   BOOLEAN NOT NULL DEFAULT 0,
        source      TEXT    NOT NULL DEFAULT 'manual',
        created_at  TEXT    NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS news_created_at_idx ON news (created_at DESC)"#,
    r#"
    CREATE TABLE IF NOT EXISTS schedules (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        asset       TEXT    NOT NULL,
        language    TEXT    NOT NULL,
        days        TEXT    NOT NULL,
        times       TEXT    NOT NULL,
        mode        TEXT    NOT NULL DEFAULT 'asset',
        impacts     TEXT    NOT NULL DEFAULT '[]',
        is_active   BOOLEAN NOT NULL DEFAULT 1,
        created_at  TEXT    NOT NULL
    )
    "#,
];

/// Columns added to `schedules` after its first release, with their
/// definitions. Databases created before then get them on startup.
const SCHEDULE_UPGRADES: &[(&str, &str)] = &[
    ("mode", "TEXT NOT NULL DEFAULT 'asset'"),
    ("impacts", "TEXT NOT NULL DEFAULT '[]'"),
];

/// Create a new connection pool from the given `database_url`.
///
/// The database file is created if it does not exist yet.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, DbError> {
    info!("Connecting to database (max_connections={})", max_connections);
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create a pool over a private in-memory database with the schema applied.
///
/// Every in-memory connection is its own database, so the pool is pinned to
/// a single connection that never expires.
pub async fn create_memory_pool() -> Result<DbPool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Create the `news` and `schedules` tables if they are absent.
pub async fn init_schema(pool: &DbPool) -> Result<(), DbError> {
    info!("Ensuring database schema");
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    let columns: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info('schedules')")
            .fetch_all(pool)
            .await?;
    for (column, definition) in SCHEDULE_UPGRADES {
        if !columns.iter().any(|c| c == column) {
            info!("Adding schedules.{column}");
            sqlx::query(&format!("ALTER TABLE schedules ADD COLUMN {column} {definition}"))
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}
