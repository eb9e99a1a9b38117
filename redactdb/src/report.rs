//! Machine-readable run report, printed once per invocation.

use std::collections::BTreeMap;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupStatus {
    NotCreated,
    Kept,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    pub path: Option<String>,
    pub status: BackupStatus,
}

impl BackupInfo {
    pub fn not_created() -> Self {
        Self {
            path: None,
            status: BackupStatus::NotCreated,
        }
    }
}

/// The single JSON document a run produces, for success and
/// failed-verification outcomes alike.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub database: String,
    /// "dry-run" or "apply".
    pub mode: &'static str,
    /// Apply mode only: "success" or "failed_verification".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub backup: BackupInfo,
    pub rows_scanned: u64,
    pub pattern_hits: u64,
    pub updated_cells: u64,
    pub remaining_matches: u64,
    pub breakdown: BTreeMap<String, u64>,
    pub remaining_breakdown: BTreeMap<String, u64>,
    pub unresolved: BTreeMap<String, u64>,
}

/// Errors share the JSON channel with reports, distinguished by the
/// `error` field.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_omitted_for_dry_run() {
        let report = Report {
            database: "/tmp/app.db".into(),
            mode: "dry-run",
            status: None,
            backup: BackupInfo::not_created(),
            rows_scanned: 0,
            pattern_hits: 0,
            updated_cells: 0,
            remaining_matches: 0,
            breakdown: BTreeMap::new(),
            remaining_breakdown: BTreeMap::new(),
            unresolved: BTreeMap::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("status").is_none());
        assert_eq!(json["mode"], "dry-run");
        assert_eq!(json["backup"]["status"], "not-created");
        assert_eq!(json["backup"]["path"], serde_json::Value::Null);
    }

    #[test]
    fn test_backup_status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(BackupStatus::NotCreated).unwrap(),
            "not-created"
        );
        assert_eq!(serde_json::to_value(BackupStatus::Kept).unwrap(), "kept");
        assert_eq!(
            serde_json::to_value(BackupStatus::Deleted).unwrap(),
            "deleted"
        );
    }
}
