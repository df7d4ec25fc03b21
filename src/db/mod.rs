pub mod error;
pub mod models;

pub use error::{RepoResult, RepositoryError};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::path::Path;

use crate::state::DbPool;

pub const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // foreign_keys is per connection, so every pooled connection needs it
    // for the cascading deletes to fire.
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(8).build(manager)?;

    let conn = pool.get()?;
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        ",
    )?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction. Commits when `f`
/// returns `Ok`, rolls back otherwise.
pub fn with_transaction<T, E, F>(conn: &mut Connection, f: F) -> Result<T, E>
where
    E: From<rusqlite::Error>,
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(e) => {
            // Dropping the transaction would roll back too, but an explicit
            // rollback surfaces failures in the log.
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh migrated database in a temp dir. Keep the `TempDir` alive for
    /// as long as the pool is used.
    pub fn test_pool() -> (DbPool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = create_pool(&temp_dir.path().join("test.db")).unwrap();
        run_migrations(&pool).unwrap();
        (pool, temp_dir)
    }

    pub fn insert_user(conn: &Connection, username: &str) -> i64 {
        conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, '')",
            params![username],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn add_recipe(conn: &Connection, author_id: i64, title: &str, published: bool) -> i64 {
        conn.execute(
            "INSERT INTO recipes (title, summary, published, author_id) VALUES (?1, 'summary', ?2, ?3)",
            params![title, published, author_id],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}
