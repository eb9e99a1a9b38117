//! SQLite access for the redaction run.

pub mod schema;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Result as SqliteResult};

/// Bounded wait on a contended store before surfacing SQLITE_BUSY.
pub const BUSY_TIMEOUT_MS: u64 = 5000;

/// A single synchronous connection to the target database.
///
/// The tool is a one-shot CLI, so there is no pool and no locking around
/// the connection; transaction control is explicit because the apply
/// lifecycle (mutate, verify, then commit or rollback) spans several calls.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> SqliteResult<Self> {
        Self::open_with_timeout(path, Duration::from_millis(BUSY_TIMEOUT_MS))
    }

    pub fn open_with_timeout(path: &Path, busy_timeout: Duration) -> SqliteResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open an exclusive-write transaction up front so no other writer can
    /// interleave between the scan-time read and the mutation-time write.
    pub fn begin_immediate(&self) -> SqliteResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")
    }

    pub fn commit(&self) -> SqliteResult<()> {
        self.conn.execute_batch("COMMIT")
    }

    pub fn rollback(&self) -> SqliteResult<()> {
        self.conn.execute_batch("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_begin_immediate_fails_fast_when_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked.db");

        let holder = Database::open_with_timeout(&path, Duration::from_millis(50)).unwrap();
        holder
            .conn()
            .execute_batch("CREATE TABLE t (v TEXT)")
            .unwrap();
        holder.begin_immediate().unwrap();
        holder
            .conn()
            .execute("INSERT INTO t (v) VALUES ('x')", [])
            .unwrap();

        // Second writer must surface a bounded busy error, not hang.
        let contender = Database::open_with_timeout(&path, Duration::from_millis(50)).unwrap();
        assert!(contender.begin_immediate().is_err());

        holder.rollback().unwrap();
        assert!(contender.begin_immediate().is_ok());
        contender.rollback().unwrap();
    }

    #[test]
    fn test_rollback_restores_prior_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.db");
        let db = Database::open(&path).unwrap();
        db.conn()
            .execute_batch("CREATE TABLE t (v TEXT); INSERT INTO t (v) VALUES ('before')")
            .unwrap();

        db.begin_immediate().unwrap();
        db.conn()
            .execute("UPDATE t SET v = 'after'", [])
            .unwrap();
        db.rollback().unwrap();

        let v: String = db
            .conn()
            .query_row("SELECT v FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, "before");
    }
}
