//! Pre-apply backup of the database file.
//!
//! The backup is a plain file copy taken before the write transaction
//! opens, so it always reflects true pre-run state regardless of how the
//! run ends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Sibling path `<db>.bak.<YYYYmmdd-HHMMSS>`.
pub fn backup_path_for(db_path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let file_name = db_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    db_path.with_file_name(format!("{}.bak.{}", file_name, stamp))
}

pub fn create_backup(db_path: &Path) -> io::Result<PathBuf> {
    let backup_path = backup_path_for(db_path);
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path)
}

/// Best-effort removal after a successful apply. Returns whether the
/// backup is gone; failure never affects the committed data.
pub fn delete_backup(backup_path: &Path) -> bool {
    match fs::remove_file(backup_path) {
        Ok(()) => true,
        Err(err) if err.kind() == io::ErrorKind::NotFound => true,
        Err(err) => {
            log::warn!(
                "failed to delete backup {}: {}",
                backup_path.display(),
                err
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_is_timestamped_sibling() {
        let path = backup_path_for(Path::new("/data/app.db"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app.db.bak."));
        assert_eq!(path.parent(), Some(Path::new("/data")));
    }

    #[test]
    fn test_create_backup_copies_bytes() {
        let dir = tempdir().unwrap();
        let db = dir.path().join("app.db");
        fs::write(&db, b"db contents").unwrap();

        let backup = create_backup(&db).unwrap();
        assert_eq!(fs::read(&backup).unwrap(), b"db contents");
    }

    #[test]
    fn test_delete_backup_tolerates_missing_file() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("nope.bak");
        assert!(delete_backup(&gone));
    }
}
