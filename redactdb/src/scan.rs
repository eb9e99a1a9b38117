//! Scan/mutate driver and the independent verification re-scan.
//!
//! The driver walks every user table with text-like columns, redacts each
//! text cell, and in apply mode issues one targeted UPDATE per changed row
//! restricted to the changed columns. Verification re-derives the residual
//! match count from the live cell contents; it never trusts the driver's
//! own bookkeeping.

use std::collections::BTreeMap;

use rusqlite::types::Value;
use rusqlite::{Connection, Result as SqliteResult, ToSql};
use serde::Serialize;

use crate::db::schema;
use crate::patterns;

/// Counters accumulated by one driver pass.
///
/// `updated_cells` counts cells whose redacted value differs from the
/// original — identical in dry-run and apply mode, since both run the same
/// redaction logic.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMetrics {
    pub rows_scanned: u64,
    pub updated_cells: u64,
    /// Per-rule hit counts; every rule is present, zero or not.
    pub breakdown: BTreeMap<String, u64>,
    /// Tables with text content but no usable row key, keyed
    /// `<table>.__table__`.
    pub unresolved: BTreeMap<String, u64>,
}

impl ScanMetrics {
    pub fn total_hits(&self) -> u64 {
        self.breakdown.values().sum()
    }
}

/// Residual matches found by the verification re-scan.
#[derive(Debug, Clone, Serialize)]
pub struct RemainingMatches {
    pub total: u64,
    pub breakdown: BTreeMap<String, u64>,
}

/// A table worth scanning: its text-like columns plus the key columns that
/// address a row for update (empty = unresolved).
struct TableTarget {
    table: String,
    text_columns: Vec<String>,
    key_columns: Vec<String>,
}

fn table_targets(conn: &Connection) -> SqliteResult<Vec<TableTarget>> {
    let mut targets = Vec::new();
    for table in schema::list_tables(conn)? {
        let columns = schema::table_columns(conn, &table)?;
        let text_columns: Vec<String> = columns
            .iter()
            .filter(|c| schema::is_text_like(&c.declared_type))
            .map(|c| c.name.clone())
            .collect();
        if text_columns.is_empty() {
            continue;
        }
        let key_columns = schema::pick_key_columns(conn, &table, &columns);
        targets.push(TableTarget {
            table,
            text_columns,
            key_columns,
        });
    }
    Ok(targets)
}

/// `rowid` is addressed bare; everything else is quoted.
fn column_expr(name: &str) -> String {
    if name == "rowid" {
        name.to_string()
    } else {
        schema::quote_ident(name)
    }
}

/// Walk every qualifying table, redact text cells, and (in apply mode)
/// update changed rows in place. Unresolved tables are recorded and skipped
/// for both mutation and hit accounting; the verification pass still
/// covers them.
pub fn scan_and_update(conn: &Connection, apply: bool) -> SqliteResult<ScanMetrics> {
    let targets = table_targets(conn)?;
    scan_targets(conn, targets, apply)
}

fn scan_targets(
    conn: &Connection,
    targets: Vec<TableTarget>,
    apply: bool,
) -> SqliteResult<ScanMetrics> {
    let mut metrics = ScanMetrics {
        rows_scanned: 0,
        updated_cells: 0,
        breakdown: patterns::zeroed_breakdown(),
        unresolved: BTreeMap::new(),
    };

    for target in targets {
        if target.key_columns.is_empty() {
            log::warn!(
                "table {} has text columns but no usable row key; skipping mutation",
                target.table
            );
            *metrics
                .unresolved
                .entry(format!("{}.__table__", target.table))
                .or_insert(0) += 1;
            continue;
        }

        let key_count = target.key_columns.len();
        let select_list: Vec<String> = target
            .key_columns
            .iter()
            .chain(target.text_columns.iter())
            .map(|c| column_expr(c))
            .collect();
        let sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            schema::quote_ident(&target.table)
        );

        // Materialize the rows first so updates do not interleave with an
        // open cursor on the same table.
        let rows: Vec<(Vec<Value>, Vec<Value>)> = {
            let mut stmt = conn.prepare(&sql)?;
            let mapped = stmt.query_map([], |row| {
                let mut keys = Vec::with_capacity(key_count);
                for i in 0..key_count {
                    keys.push(row.get::<_, Value>(i)?);
                }
                let mut cells = Vec::with_capacity(target.text_columns.len());
                for i in 0..target.text_columns.len() {
                    cells.push(row.get::<_, Value>(key_count + i)?);
                }
                Ok((keys, cells))
            })?;
            mapped.collect::<SqliteResult<Vec<_>>>()?
        };

        for (keys, cells) in rows {
            metrics.rows_scanned += 1;

            let mut changed: Vec<(&str, String)> = Vec::new();
            for (column, cell) in target.text_columns.iter().zip(&cells) {
                let Value::Text(original) = cell else {
                    continue;
                };
                let redacted = patterns::redact(original, &mut metrics.breakdown);
                if redacted != *original {
                    changed.push((column.as_str(), redacted));
                }
            }
            if changed.is_empty() {
                continue;
            }
            metrics.updated_cells += changed.len() as u64;

            if apply {
                update_row(conn, &target, &changed, &keys)?;
            }
        }
    }

    Ok(metrics)
}

/// One UPDATE touching only the changed columns, addressed by key values.
fn update_row(
    conn: &Connection,
    target: &TableTarget,
    changed: &[(&str, String)],
    keys: &[Value],
) -> SqliteResult<()> {
    let set_clause: Vec<String> = changed
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", schema::quote_ident(column), i + 1))
        .collect();
    let where_clause: Vec<String> = target
        .key_columns
        .iter()
        .enumerate()
        .map(|(i, key)| format!("{} = ?{}", column_expr(key), changed.len() + i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        schema::quote_ident(&target.table),
        set_clause.join(", "),
        where_clause.join(" AND ")
    );

    let mut params: Vec<Box<dyn ToSql>> = Vec::with_capacity(changed.len() + keys.len());
    for (_, value) in changed {
        params.push(Box::new(value.clone()));
    }
    for key in keys {
        params.push(Box::new(key.clone()));
    }
    let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_ref.as_slice())?;
    Ok(())
}

/// Independent residual-match count over every text-like cell, unresolved
/// tables included. Gates commit after a tentative apply.
pub fn scan_remaining(conn: &Connection) -> SqliteResult<RemainingMatches> {
    let mut breakdown = patterns::zeroed_breakdown();
    let mut total = 0u64;

    for target in table_targets(conn)? {
        let select_list: Vec<String> = target
            .text_columns
            .iter()
            .map(|c| schema::quote_ident(c))
            .collect();
        let sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            schema::quote_ident(&target.table)
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(target.text_columns.len());
            for i in 0..target.text_columns.len() {
                cells.push(row.get::<_, Value>(i)?);
            }
            Ok(cells)
        })?;
        for cells in rows {
            for cell in cells? {
                let Value::Text(text) = cell else {
                    continue;
                };
                for rule in patterns::rules() {
                    let count = rule.match_count(&text) as u64;
                    if count > 0 {
                        *breakdown.entry(rule.name().to_string()).or_insert(0) += count;
                        total += count;
                    }
                }
            }
        }
    }

    Ok(RemainingMatches { total, breakdown })
}
