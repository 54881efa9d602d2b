//! SQLite store for username hygiene.
//!
//! Implements `UserStore` using rusqlite (bundled). The connection is
//! protected by a `parking_lot::ReentrantMutex<RefCell<Connection>>` so that
//! the apply phase can hold the lock for the duration of its transaction
//! while read helpers keep working off the same handle.

use std::cell::RefCell;
use std::path::Path;

use parking_lot::ReentrantMutex;
use rusqlite::params;

use crate::error::{DedupError, Result, StoreError};
use crate::types::{RenameMap, User, UsernameCount};

use super::traits::UserStore;

/// Map a rusqlite error to a `DedupError`.
fn store_err(e: rusqlite::Error) -> DedupError {
    DedupError::Store(StoreError::Sqlite(e))
}

/// Map a rusqlite error to a `DedupError` naming the failed query.
fn query_err(query: &'static str) -> impl FnOnce(rusqlite::Error) -> DedupError {
    move |e| DedupError::Store(StoreError::Query { query, source: e })
}

/// Map a rusqlite error to a transaction-phase `DedupError`.
fn tx_err(message: impl Into<String>) -> impl FnOnce(rusqlite::Error) -> DedupError {
    move |e| {
        DedupError::Store(StoreError::Transaction {
            message: message.into(),
            source: Some(Box::new(e)),
        })
    }
}

// ============================================================================
// SqliteStore
// ============================================================================

/// SQLite-backed `UserStore`.
pub struct SqliteStore {
    conn: ReentrantMutex<RefCell<rusqlite::Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open a file-backed database and verify the connection with a ping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection_err = |source| {
            DedupError::Store(StoreError::Connection {
                path: path.display().to_string(),
                source,
            })
        };
        let conn = rusqlite::Connection::open(path).map_err(connection_err)?;
        // SQLite defers touching the file until first use; ping now so a bad
        // path fails at open time rather than mid-resolution.
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(connection_err)?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
        })
    }

    /// Open an in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(store_err)?;
        Ok(Self {
            conn: ReentrantMutex::new(RefCell::new(conn)),
        })
    }

    /// Create tables, indexes, and pragmas. Idempotent.
    ///
    /// In production the `users` table usually belongs to the host
    /// application; this bootstrap exists for fresh databases, demos, and
    /// tests.
    pub fn initialize(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA busy_timeout=5000;",
            )?;

            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id       INTEGER PRIMARY KEY,
                    username TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_users_username
                    ON users(username);
                CREATE TABLE IF NOT EXISTS disallowed_usernames (
                    invalid_username TEXT PRIMARY KEY
                );",
            )
        })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    /// Execute `f` with a shared reference to the underlying connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Connection) -> rusqlite::Result<T>,
    {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        f(&conn).map_err(store_err)
    }

    /// Parse a single rusqlite row into a `User`.
    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
        })
    }

    /// Run a `(id, username)` query and collect the users.
    fn query_users(&self, query: &'static str, sql: &str) -> Result<Vec<User>> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn.prepare_cached(sql).map_err(query_err(query))?;
        let rows = stmt
            .query_map([], Self::row_to_user)
            .map_err(query_err(query))?;
        let users: rusqlite::Result<Vec<_>> = rows.collect();
        users.map_err(query_err(query))
    }

    // -----------------------------------------------------------------------
    // Fixture / audit surface
    // -----------------------------------------------------------------------

    /// Insert a user row (fixtures and demo seeding).
    pub fn add_user(&self, id: i64, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username) VALUES (?1, ?2)",
                params![id, username],
            )
            .map(|_| ())
        })
    }

    /// Add a username to the denylist (fixtures and demo seeding).
    pub fn add_denylisted_username(&self, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO disallowed_usernames (invalid_username) VALUES (?1)",
                params![username],
            )
            .map(|_| ())
        })
    }

    /// Run arbitrary SQL against the store's connection. Escape hatch for
    /// schema tweaks and test fixtures that need more than the insert
    /// helpers (e.g. triggers).
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| conn.execute_batch(sql))
    }

    /// Every user row, ordered by id. Snapshot helper for audits and
    /// before/after comparisons.
    pub fn all_users(&self) -> Result<Vec<User>> {
        self.query_users("all_users", "SELECT id, username FROM users ORDER BY id")
    }
}

// ============================================================================
// UserStore implementation
// ============================================================================

impl UserStore for SqliteStore {
    fn find_duplicate_usernames(&self) -> Result<Vec<User>> {
        // A single statement executes against one consistent snapshot, so no
        // user can be missed or double-counted by a concurrent writer.
        self.query_users(
            "find_duplicate_usernames",
            "SELECT a.id, a.username
             FROM users a
             JOIN (
                 SELECT username
                 FROM users
                 GROUP BY username
                 HAVING COUNT(*) > 1) b
             ON a.username = b.username
             ORDER BY a.username, a.id",
        )
    }

    fn find_denylisted_usernames(&self) -> Result<Vec<User>> {
        self.query_users(
            "find_denylisted_usernames",
            "SELECT id, username FROM users
             WHERE username IN
                 (SELECT invalid_username FROM disallowed_usernames)
             ORDER BY username, id",
        )
    }

    fn duplicate_username_counts(&self) -> Result<Vec<UsernameCount>> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = conn
            .prepare_cached(
                "SELECT username, COUNT(*) AS count
                 FROM users
                 GROUP BY username
                 HAVING count > 1
                 ORDER BY username",
            )
            .map_err(query_err("duplicate_username_counts"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(UsernameCount {
                    username: row.get(0)?,
                    count: row.get(1)?,
                })
            })
            .map_err(query_err("duplicate_username_counts"))?;
        let counts: rusqlite::Result<Vec<_>> = rows.collect();
        counts.map_err(query_err("duplicate_username_counts"))
    }

    fn apply_renames(&self, renames: &RenameMap) -> Result<()> {
        if renames.is_empty() {
            return Ok(());
        }

        let guard = self.conn.lock();
        let mut conn = guard.borrow_mut();
        // Transaction rolls back on drop unless committed.
        let tx = conn.transaction().map_err(tx_err("begin failed"))?;
        {
            let mut stmt = tx
                .prepare_cached("UPDATE users SET username = ?1 WHERE id = ?2")
                .map_err(tx_err("prepare failed"))?;
            for (id, username) in renames {
                stmt.execute(params![username, id])
                    .map_err(tx_err(format!("update failed for user {id}")))?;
            }
        }
        tx.commit().map_err(tx_err("commit failed"))
    }
}
