//! Embedded single-file metadata store (spec §4.5; `plibs.c: psync_sql_*`).
//!
//! A single `rusqlite::Connection` lives behind a `parking_lot::ReentrantMutex`
//! so the same thread can re-enter (a statement callback that itself issues
//! another query doesn't deadlock), while other threads still serialize on
//! it — the same guarantee the original's `PTHREAD_MUTEX_RECURSIVE` gives.

use std::cell::RefCell;
use std::path::Path;

use parking_lot::ReentrantMutex;
use rusqlite::Connection;
use thiserror::Error;

use crate::error::{Categorize, Category};
use crate::logging::Level;
use crate::log;
use crate::variant::{Row, RowText, Variant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not open database {path}: {source}")]
    OpenFailed { path: String, #[source] source: rusqlite::Error },
    #[error("sql error running statement: {0}")]
    QueryFailed(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn category(&self) -> Category {
        match self {
            StoreError::OpenFailed { .. } => Category::PermFail,
            StoreError::QueryFailed(_) => Category::TempFail,
        }
    }
}

impl Categorize for StoreError {
    fn category(&self) -> Category {
        StoreError::category(self)
    }
}

/// The metadata store. `Store::open` is the one operation expected to abort
/// the process on failure (spec §4.5 "connect failure at open time is
/// fatal"); everything after that degrades to logging + a documented
/// sentinel rather than panicking.
pub struct Store {
    conn: ReentrantMutex<RefCell<Connection>>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path_display = path.as_ref().display().to_string();
        let conn = Connection::open(path.as_ref()).map_err(|source| StoreError::OpenFailed {
            path: path_display,
            source,
        })?;
        Ok(Store { conn: ReentrantMutex::new(RefCell::new(conn)) })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Store { conn: ReentrantMutex::new(RefCell::new(conn)) })
    }

    /// Runs a statement with no result set expected. Logs at `Error` and
    /// returns `StoreError` on failure (spec §4.5 "failure semantics").
    pub fn statement(&self, sql: &str) -> Result<(), StoreError> {
        self.statement_params(sql, [])
    }

    pub fn statement_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<(), StoreError> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        conn.execute(sql, params).map(|_| ()).map_err(|e| {
            log!(Level::Error, "error running sql statement: {}: {}", sql, e);
            StoreError::QueryFailed(e)
        })
    }

    /// Returns the first column of the first row as text, or `None` on no
    /// rows / error (matching `psync_sql_cellstr`'s NULL-on-miss contract).
    pub fn cell_text(&self, sql: &str) -> Option<String> {
        self.cell_text_params(sql, [])
    }

    pub fn cell_text_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Option<String> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let result = conn.query_row(sql, params, |row| row.get::<_, Option<String>>(0));
        match result {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                log!(Level::Error, "error running sql statement: {}: {}", sql, e);
                None
            }
        }
    }

    /// Returns the first column of the first row as an integer, or `dflt`
    /// on no rows / error (matching `psync_sql_cellint`).
    pub fn cell_int(&self, sql: &str, dflt: i64) -> i64 {
        self.cell_int_params(sql, [], dflt)
    }

    pub fn cell_int_params<P: rusqlite::Params>(&self, sql: &str, params: P, dflt: i64) -> i64 {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let result = conn.query_row(sql, params, |row| row.get::<_, i64>(0));
        match result {
            Ok(value) => value,
            Err(rusqlite::Error::QueryReturnedNoRows) => dflt,
            Err(e) => {
                log!(Level::Error, "error running sql statement: {}: {}", sql, e);
                dflt
            }
        }
    }

    /// Returns the full first row as an all-text projection, or `None`
    /// (matching `psync_sql_rowstr`).
    pub fn row_text(&self, sql: &str) -> Option<RowText> {
        self.row_text_params(sql, [])
    }

    pub fn row_text_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Option<RowText> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(e) => {
                log!(Level::Error, "error running sql statement: {}: {}", sql, e);
                return None;
            }
        };
        let col_count = stmt.column_count();
        let mut rows = match stmt.query(params) {
            Ok(r) => r,
            Err(e) => {
                log!(Level::Error, "sqlite3_step returned error: {}: {}", sql, e);
                return None;
            }
        };
        match rows.next() {
            Ok(Some(row)) => {
                let mut out = Vec::with_capacity(col_count);
                for i in 0..col_count {
                    let text = match row.get_ref(i).ok()? {
                        rusqlite::types::ValueRef::Null => None,
                        rusqlite::types::ValueRef::Integer(n) => Some(n.to_string()),
                        rusqlite::types::ValueRef::Real(r) => Some(r.to_string()),
                        rusqlite::types::ValueRef::Text(t) => {
                            Some(String::from_utf8_lossy(t).into_owned())
                        }
                        rusqlite::types::ValueRef::Blob(b) => {
                            Some(String::from_utf8_lossy(b).into_owned())
                        }
                    };
                    out.push(text);
                }
                Some(out)
            }
            Ok(None) => None,
            Err(e) => {
                log!(Level::Error, "sqlite3_step returned error: {}: {}", sql, e);
                None
            }
        }
    }

    /// Returns the full first row, type-preserving (matching `psync_sql_row`).
    pub fn row(&self, sql: &str) -> Option<Row> {
        self.row_params(sql, [])
    }

    pub fn row_params<P: rusqlite::Params>(&self, sql: &str, params: P) -> Option<Row> {
        let guard = self.conn.lock();
        let conn = guard.borrow();
        let mut stmt = match conn.prepare(sql) {
            Ok(s) => s,
            Err(e) => {
                log!(Level::Error, "error running sql statement: {}: {}", sql, e);
                return None;
            }
        };
        let col_count = stmt.column_count();
        let mut rows = match stmt.query(params) {
            Ok(r) => r,
            Err(e) => {
                log!(Level::Error, "sqlite3_step returned error: {}: {}", sql, e);
                return None;
            }
        };
        match rows.next() {
            Ok(Some(row)) => {
                let mut out = Vec::with_capacity(col_count);
                for i in 0..col_count {
                    let value = row.get_ref(i).ok()?;
                    out.push(match value {
                        rusqlite::types::ValueRef::Null => Variant::Null,
                        rusqlite::types::ValueRef::Integer(n) => Variant::Integer(n),
                        rusqlite::types::ValueRef::Real(r) => Variant::Real(r),
                        rusqlite::types::ValueRef::Text(t) => {
                            Variant::Text(String::from_utf8_lossy(t).into_owned())
                        }
                        rusqlite::types::ValueRef::Blob(b) => {
                            Variant::Text(String::from_utf8_lossy(b).into_owned())
                        }
                    });
                }
                Some(out)
            }
            Ok(None) => None,
            Err(e) => {
                log!(Level::Error, "sqlite3_step returned error: {}: {}", sql, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.statement("CREATE TABLE file (id INTEGER PRIMARY KEY, name TEXT, size REAL)").unwrap();
        store.statement("INSERT INTO file (name, size) VALUES ('a.txt', 12.5)").unwrap();
        store
    }

    #[test]
    fn cell_text_and_cell_int_round_trip() {
        let store = seeded_store();
        assert_eq!(store.cell_text("SELECT name FROM file"), Some("a.txt".to_string()));
        assert_eq!(store.cell_int("SELECT id FROM file", -1), 1);
        assert_eq!(store.cell_int("SELECT id FROM file WHERE id=99", -1), -1);
        assert_eq!(store.cell_text("SELECT name FROM file WHERE id=99"), None);
    }

    #[test]
    fn row_preserves_column_types() {
        let store = seeded_store();
        let row = store.row("SELECT id, name, size FROM file").unwrap();
        assert_eq!(row[0].expect_number(), 1);
        assert_eq!(row[1].expect_string(), "a.txt");
        assert_eq!(row[2].expect_real(), 12.5);
    }

    #[test]
    fn row_text_renders_every_column_as_text() {
        let store = seeded_store();
        let row = store.row_text("SELECT id, name FROM file").unwrap();
        assert_eq!(row[0].as_deref(), Some("1"));
        assert_eq!(row[1].as_deref(), Some("a.txt"));
    }

    #[test]
    fn parameterized_queries_bind_values() {
        let store = seeded_store();
        let name = store.cell_text_params(
            "SELECT name FROM file WHERE id = ?1",
            rusqlite::params![1],
        );
        assert_eq!(name, Some("a.txt".to_string()));
    }

    #[test]
    fn bad_sql_logs_and_returns_none_rather_than_panicking() {
        let store = seeded_store();
        assert_eq!(store.cell_text("SELECT * FROM no_such_table"), None);
        assert!(store.statement("GARBAGE SQL").is_err());
    }

    #[test]
    fn reentrant_lock_allows_same_thread_nested_access() {
        let store = seeded_store();
        let guard = store.conn.lock();
        // Re-entering from the same thread must not deadlock.
        let inner = store.conn.lock();
        assert_eq!(inner.borrow().query_row::<i64, _, _>("SELECT 1", [], |r| r.get(0)).unwrap(), 1);
        drop(inner);
        drop(guard);
    }
}
