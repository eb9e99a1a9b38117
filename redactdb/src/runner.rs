//! Run orchestration: backup, transaction lifecycle, verification gate.
//!
//! Apply lifecycle: backup (unless skipped) -> BEGIN IMMEDIATE ->
//! scan/mutate -> independent verification re-scan -> COMMIT only when
//! zero matches remain, ROLLBACK otherwise. Every non-success exit path
//! out of the open transaction rolls back, so the store is always either
//! fully pre-run or fully committed.

use std::path::PathBuf;

use crate::backup;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::report::{BackupInfo, BackupStatus, Report};
use crate::scan;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub db_path: PathBuf,
    /// Mutate in place; dry-run otherwise.
    pub apply: bool,
    /// Skip the pre-apply backup copy.
    pub no_backup: bool,
    /// Remove the backup after a successful commit.
    pub delete_backup: bool,
}

/// How a run ended, for exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    DryRunComplete,
    ApplySuccess,
    FailedVerification,
}

pub fn run(opts: &RunOptions) -> Result<(Report, RunStatus)> {
    if !opts.db_path.exists() {
        return Err(Error::NotFound(opts.db_path.clone()));
    }

    if !opts.apply {
        return dry_run(opts);
    }

    let mut backup_info = BackupInfo::not_created();
    if !opts.no_backup {
        let backup_path = backup::create_backup(&opts.db_path)?;
        log::info!("backup written to {}", backup_path.display());
        backup_info = BackupInfo {
            path: Some(backup_path.to_string_lossy().into_owned()),
            status: BackupStatus::Kept,
        };
    }

    let db = Database::open(&opts.db_path)?;
    db.begin_immediate()?;

    // From here on, any failure must roll back before surfacing.
    let (metrics, remaining) = match mutate_and_verify(&db) {
        Ok(result) => result,
        Err(err) => {
            if let Err(rollback_err) = db.rollback() {
                log::error!("rollback after failure also failed: {}", rollback_err);
            }
            return Err(err.into());
        }
    };

    if remaining.total != 0 {
        log::warn!(
            "{} matches remain after mutation; rolling back",
            remaining.total
        );
        db.rollback()?;
        let report = build_report(
            opts,
            "apply",
            Some("failed_verification"),
            backup_info,
            &metrics,
            &remaining,
        );
        return Ok((report, RunStatus::FailedVerification));
    }

    if let Err(err) = db.commit() {
        if let Err(rollback_err) = db.rollback() {
            log::error!("rollback after failed commit also failed: {}", rollback_err);
        }
        return Err(err.into());
    }

    // Post-commit cleanup is best-effort; the committed data stands
    // either way.
    if opts.delete_backup {
        if let Some(path) = backup_info.path.clone() {
            if backup::delete_backup(std::path::Path::new(&path)) {
                backup_info.status = BackupStatus::Deleted;
            }
        }
    }

    let report = build_report(
        opts,
        "apply",
        Some("success"),
        backup_info,
        &metrics,
        &remaining,
    );
    Ok((report, RunStatus::ApplySuccess))
}

/// Dry-run: no backup, no transaction, zero writes. Metrics come from the
/// identical redaction logic, so they preview apply-mode effect.
fn dry_run(opts: &RunOptions) -> Result<(Report, RunStatus)> {
    let db = Database::open(&opts.db_path)?;
    let metrics = scan::scan_and_update(db.conn(), false)?;
    let remaining = scan::scan_remaining(db.conn())?;
    let report = build_report(
        opts,
        "dry-run",
        None,
        BackupInfo::not_created(),
        &metrics,
        &remaining,
    );
    Ok((report, RunStatus::DryRunComplete))
}

fn mutate_and_verify(
    db: &Database,
) -> rusqlite::Result<(scan::ScanMetrics, scan::RemainingMatches)> {
    let metrics = scan::scan_and_update(db.conn(), true)?;
    let remaining = scan::scan_remaining(db.conn())?;
    Ok((metrics, remaining))
}

fn build_report(
    opts: &RunOptions,
    mode: &'static str,
    status: Option<&'static str>,
    backup: BackupInfo,
    metrics: &scan::ScanMetrics,
    remaining: &scan::RemainingMatches,
) -> Report {
    Report {
        database: opts.db_path.to_string_lossy().into_owned(),
        mode,
        status,
        backup,
        rows_scanned: metrics.rows_scanned,
        pattern_hits: metrics.total_hits(),
        updated_cells: metrics.updated_cells,
        remaining_matches: remaining.total,
        breakdown: metrics.breakdown.clone(),
        remaining_breakdown: remaining.breakdown.clone(),
        unresolved: metrics.unresolved.clone(),
    }
}
