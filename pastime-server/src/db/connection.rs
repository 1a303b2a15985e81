use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use uuid::Uuid;

use super::schema::{DEMO_DATA, DEMO_PASSWORD, DEMO_PASSWORD_PLACEHOLDER, SCHEMA};
use crate::password::hash_password;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// Name of the Unicode lowercase SQL function used for case-insensitive matching
const CASEFOLD_FN: &str = "casefold";

/// Per-connection setup: foreign keys on, and `casefold(x)` registered.
///
/// SQLite's built-in `lower()` only folds ASCII letters, so matching goes
/// through `casefold`, which lowercases with the same rules as
/// `str::to_lowercase`. NULL stays NULL.
fn prepare_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )
}

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager = Self::create_connection_manager(path)?;
        let pool = Pool::new(manager).context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    ///
    /// `":memory:"` (any case, surrounding whitespace ignored) maps to a
    /// uniquely named shared-cache in-memory database, so every pooled
    /// connection sees the same tables.
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> Result<SqliteConnectionManager> {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        let manager = if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            let uri = format!("file:pastime-{}?mode=memory&cache=shared", Uuid::new_v4());
            SqliteConnectionManager::file(uri).with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
        } else {
            SqliteConnectionManager::file(path)
        };

        Ok(manager.with_init(prepare_connection))
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the database with demo users, groups and posts
    ///
    /// Demo accounts are inserted with a placeholder credential that is
    /// replaced by a real hash of `DEMO_PASSWORD`.
    pub fn seed_demo_data(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(DEMO_DATA)
            .context("Failed to seed demo data")?;

        let pending: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE password_hash = ?",
            [DEMO_PASSWORD_PLACEHOLDER],
            |row| row.get(0),
        )?;
        if pending > 0 {
            let hash = hash_password(DEMO_PASSWORD)?;
            conn.execute(
                "UPDATE users SET password_hash = ? WHERE password_hash = ?",
                [hash.as_str(), DEMO_PASSWORD_PLACEHOLDER],
            )
            .context("Failed to set demo passwords")?;
        }
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}
