//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2 and creates
//! the preview table on pool initialization. The pool is the durable tier of
//! the two-tier preview cache.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::error::{Error, Result};

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// One logical table, one row per file path, overwritten on put.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS previews (
    file_path TEXT PRIMARY KEY,
    data_url  TEXT NOT NULL,
    mtime     INTEGER NOT NULL
);
";

/// Initialize a new database pool with the given file path.
///
/// Creates the SQLite database file if it doesn't exist, sets up connection
/// pooling with r2d2, and creates the preview table.
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for schema init: {}", e)))?;

    init_schema(&conn)
        .map_err(|e| Error::database(format!("Failed to create schema: {}", e)))?;

    Ok(pool)
}

/// Initialize an in-memory database pool for testing.
///
/// The pool holds a single connection so every checkout sees the same
/// in-memory database. It is lost when the pool is dropped.
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for schema init: {}", e)))?;

    init_schema(&conn)
        .map_err(|e| Error::database(format!("Failed to create schema: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool, converting the r2d2 error into our
/// common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}
