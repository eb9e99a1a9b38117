//! Schema introspection against an unknown database layout.
//!
//! Nothing here assumes a particular application schema: tables come from
//! `sqlite_master`, column shapes from `PRAGMA table_info`, and row
//! addressing falls back from the engine rowid to declared primary-key
//! columns, or to "unresolved" when neither exists.

use rusqlite::{Connection, Result as SqliteResult};

/// Declared-type markers that classify a column as text-like.
///
/// An empty declared type is also text-like: dynamically-typed columns may
/// still hold text.
const TEXT_TYPE_MARKERS: &[&str] = &["TEXT", "CHAR", "CLOB"];

/// One column from `PRAGMA table_info`.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type, uppercased; empty when the column has none.
    pub declared_type: String,
    /// 1-based position within the primary key, 0 when not part of it.
    pub pk_rank: i64,
}

/// Double-quote an identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// User tables in deterministic (name) order; sqlite-internal tables are
/// excluded.
pub fn list_tables(conn: &Connection) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<SqliteResult<Vec<String>>>()?;
    Ok(names)
}

pub fn table_columns(conn: &Connection, table: &str) -> SqliteResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get(1)?,
                declared_type: row
                    .get::<_, Option<String>>(2)?
                    .unwrap_or_default()
                    .to_uppercase(),
                pk_rank: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            })
        })?
        .collect::<SqliteResult<Vec<ColumnInfo>>>()?;
    Ok(columns)
}

pub fn is_text_like(declared_type: &str) -> bool {
    declared_type.is_empty()
        || TEXT_TYPE_MARKERS
            .iter()
            .any(|marker| declared_type.contains(marker))
}

/// Declared primary-key columns in key-rank order.
pub fn declared_pk_columns(columns: &[ColumnInfo]) -> Vec<String> {
    let mut pk: Vec<&ColumnInfo> = columns.iter().filter(|c| c.pk_rank > 0).collect();
    pk.sort_by_key(|c| c.pk_rank);
    pk.into_iter().map(|c| c.name.clone()).collect()
}

/// Columns that uniquely address a row for update.
///
/// Three-tier fallback: the engine rowid when the table has one, else the
/// declared primary key, else empty. Empty means the table is unresolved —
/// the caller must report it, never silently skip it.
pub fn pick_key_columns(conn: &Connection, table: &str, columns: &[ColumnInfo]) -> Vec<String> {
    let probe = format!("SELECT rowid FROM {} LIMIT 1", quote_ident(table));
    if conn.prepare(&probe).is_ok() {
        return vec!["rowid".to_string()];
    }
    declared_pk_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_list_tables_sorted_by_name() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TABLE zebra (v TEXT);
             CREATE TABLE alpha (v TEXT);
             CREATE TABLE \"mid table\" (v TEXT);",
        )
        .unwrap();
        let tables = list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["alpha", "mid table", "zebra"]);
    }

    #[test]
    fn test_table_columns_capture_type_and_pk_rank() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TABLE t (
                id INTEGER PRIMARY KEY,
                body text,
                payload,
                amount REAL
             )",
        )
        .unwrap();
        let columns = table_columns(&conn, "t").unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[0].name, "id");
        assert_eq!(columns[0].declared_type, "INTEGER");
        assert_eq!(columns[0].pk_rank, 1);
        // Declared types are normalized to uppercase.
        assert_eq!(columns[1].declared_type, "TEXT");
        assert_eq!(columns[2].declared_type, "");
        assert_eq!(columns[3].pk_rank, 0);
    }

    #[test]
    fn test_is_text_like_markers() {
        assert!(is_text_like(""));
        assert!(is_text_like("TEXT"));
        assert!(is_text_like("VARCHAR(255)"));
        assert!(is_text_like("NCHAR(10)"));
        assert!(is_text_like("CLOB"));
        assert!(!is_text_like("INTEGER"));
        assert!(!is_text_like("REAL"));
        assert!(!is_text_like("BLOB"));
    }

    #[test]
    fn test_pick_key_columns_prefers_rowid() {
        let conn = memory_db();
        conn.execute_batch("CREATE TABLE t (a TEXT, b TEXT)").unwrap();
        let columns = table_columns(&conn, "t").unwrap();
        assert_eq!(pick_key_columns(&conn, "t", &columns), vec!["rowid"]);
    }

    #[test]
    fn test_pick_key_columns_falls_back_to_pk_for_without_rowid() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TABLE t (k2 TEXT, k1 TEXT, v TEXT, PRIMARY KEY (k1, k2)) WITHOUT ROWID",
        )
        .unwrap();
        let columns = table_columns(&conn, "t").unwrap();
        // Key-rank order, not declaration order.
        assert_eq!(pick_key_columns(&conn, "t", &columns), vec!["k1", "k2"]);
    }

    #[test]
    fn test_declared_pk_columns_empty_when_no_key() {
        let columns = vec![
            ColumnInfo {
                name: "a".into(),
                declared_type: "TEXT".into(),
                pk_rank: 0,
            },
            ColumnInfo {
                name: "b".into(),
                declared_type: String::new(),
                pk_rank: 0,
            },
        ];
        assert!(declared_pk_columns(&columns).is_empty());
    }

    #[test]
    fn test_quote_ident_doubles_embedded_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }
}
