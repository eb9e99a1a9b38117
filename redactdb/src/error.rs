//! Error taxonomy for a redaction run.

use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a run.
///
/// Verification failure is not here: it is a reported outcome, not an
/// error — the run rolls back and completes with a
/// `failed_verification` status. Unresolved tables are plain data in the
/// metrics.
#[derive(Debug)]
pub enum Error {
    /// Target database file does not exist; no transaction was opened.
    NotFound(PathBuf),
    /// Datastore-level failure during any phase; rollback has already been
    /// attempted by the time this surfaces.
    Sqlite(rusqlite::Error),
    /// Filesystem failure, e.g. while writing the pre-apply backup.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound(path) => write!(f, "Database not found: {}", path.display()),
            Error::Sqlite(err) => write!(f, "SQLite operational error: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::Sqlite(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
