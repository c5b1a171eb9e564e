//! SQLite backend.
//!
//! Every call opens its own read-only connection, so a handle can be shared
//! across threads without a pool and never holds the file open between calls.

mod readonly;
mod values;

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::McpResult;

pub use readonly::{is_select_query, READ_ONLY_REJECTION};
pub use values::to_json;

/// One result row, keys in column order
pub type Row = Map<String, Value>;

const LIST_TABLES_SQL: &str = "SELECT name FROM sqlite_master WHERE type='table';";

/// Handle to a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
}

impl SqliteDatabase {
    /// Create a handle; the file is not touched until the first call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> McpResult<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Ok(Connection::open_with_flags(&self.path, flags)?)
    }

    /// Names of all tables, in `sqlite_master` order
    pub fn list_tables(&self) -> McpResult<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(LIST_TABLES_SQL)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = names.len(), "listed tables");
        Ok(names)
    }

    /// Run a statement and collect every row as a column-name keyed map.
    ///
    /// No policy is applied here; callers check [`is_select_query`] first.
    pub fn execute_query(&self, sql: &str) -> McpResult<Vec<Row>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Map::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), to_json(row.get_ref(idx)?));
            }
            out.push(record);
        }
        debug!(rows = out.len(), "query executed");
        Ok(out)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_tables() {
        let file = seeded_db(PROPERTIES_SCHEMA);
        let db = SqliteDatabase::new(file.path());
        assert_eq!(db.list_tables().unwrap(), vec!["properties", "agents"]);
    }

    #[test]
    fn test_list_tables_empty_database() {
        let file = seeded_db("");
        let db = SqliteDatabase::new(file.path());
        assert!(db.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_select_keys_follow_columns() {
        let file = seeded_db(PROPERTIES_SCHEMA);
        let db = SqliteDatabase::new(file.path());

        let rows = db.execute_query("SELECT * FROM properties LIMIT 1").unwrap();
        assert_eq!(rows.len(), 1);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "address", "price", "photo"]);
        assert_eq!(rows[0]["address"], json!("1 Main St"));
        assert_eq!(rows[0]["price"], json!(250000.5));
        assert_eq!(rows[0]["photo"], json!("cafe"));
    }

    #[test]
    fn test_select_nulls() {
        let file = seeded_db(PROPERTIES_SCHEMA);
        let db = SqliteDatabase::new(file.path());

        let rows = db
            .execute_query("SELECT price, photo FROM properties WHERE id = 2")
            .unwrap();
        assert_eq!(rows[0]["price"], Value::Null);
        assert_eq!(rows[0]["photo"], Value::Null);
    }

    #[test]
    fn test_connection_is_read_only() {
        let file = seeded_db(PROPERTIES_SCHEMA);
        let db = SqliteDatabase::new(file.path());
        assert!(db.execute_query("DELETE FROM properties").is_err());
        assert_eq!(db.execute_query("SELECT * FROM properties").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let file = seeded_db(PROPERTIES_SCHEMA);
        let db = SqliteDatabase::new(file.path());
        let err = db.execute_query("SELECT * FROM nope").unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::new(dir.path().join("absent.db"));
        assert!(db.list_tables().is_err());
    }
}
