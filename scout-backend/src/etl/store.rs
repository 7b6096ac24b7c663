//! Scratch SQLite database that lives for a single ETL run.

use super::schema::{infer_schema, is_uid_key, UID_COLUMN};
use crate::error::{Error, Result};
use base64::Engine;
use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use scout_types::ColumnInfo;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub struct ScratchDb {
    conn: Mutex<Connection>,
    /// `None` for in-memory databases.
    path: Option<PathBuf>,
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn to_sql_value(value: Option<&Value>) -> Result<SqlValue> {
    Ok(match value {
        None | Some(Value::Null) => SqlValue::Null,
        Some(Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
        Some(nested) => SqlValue::Text(serde_json::to_string(nested)?),
    })
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(base64::engine::general_purpose::STANDARD.encode(b)),
    }
}

impl ScratchDb {
    /// Open a fresh database at `path`, removing any file left by an earlier run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("[ETL] Removing stale scratch db {}", path.display());
            std::fs::remove_file(path)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create a table for `rows` and insert them. Returns the table name.
    pub fn load(&self, rows: &[Map<String, Value>], table_type: Option<&str>) -> Result<String> {
        let table = match table_type.filter(|t| !t.is_empty()) {
            Some(kind) => format!("t_{}_{}", kind, short_id()),
            None => format!("t_{}", short_id()),
        };
        let columns = infer_schema(rows);

        let mut defs = vec![format!("{} TEXT", quote_ident(UID_COLUMN))];
        defs.extend(
            columns
                .iter()
                .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.as_str())),
        );

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(&format!("CREATE TABLE {} ({})", quote_ident(&table), defs.join(", ")), [])?;

        let names: Vec<String> = std::iter::once(UID_COLUMN)
            .chain(columns.iter().map(|c| c.name.as_str()))
            .map(quote_ident)
            .collect();
        let placeholders = vec!["?"; names.len()].join(", ");
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(&table),
                names.join(", "),
                placeholders
            ))?;
            for row in rows {
                let given = row
                    .get(UID_COLUMN)
                    .or_else(|| row.iter().find(|(k, _)| is_uid_key(k)).map(|(_, v)| v));
                let uid = match given {
                    Some(Value::String(s)) => s.clone(),
                    Some(v) if !v.is_null() => v.to_string(),
                    _ => uuid::Uuid::new_v4().to_string(),
                };
                let mut values = vec![SqlValue::Text(uid)];
                for col in &columns {
                    values.push(to_sql_value(row.get(&col.key))?);
                }
                stmt.execute(rusqlite::params_from_iter(values))?;
            }
        }
        tx.commit()?;
        log::info!("[ETL] Loaded {} rows into {}", rows.len(), table);
        Ok(table)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    pub fn table_info(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    column_type: row.get(2)?,
                    notnull: row.get::<_, i64>(3)? != 0,
                    dflt_value: row.get(4)?,
                    pk: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    /// Run a read-only statement and return rows as JSON objects.
    pub fn query(&self, sql: &str) -> Result<Vec<Map<String, Value>>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(Error::validation("Only read-only statements are allowed"));
        }
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Map::new();
            for (i, name) in names.iter().enumerate() {
                record.insert(name.clone(), from_sql_value(row.get_ref(i)?));
            }
            out.push(record);
        }
        Ok(out)
    }

    /// True when `sql` parses and does not write.
    pub fn is_read_only(&self, sql: &str) -> bool {
        let conn = self.conn.lock();
        conn.prepare(sql).map(|s| s.readonly()).unwrap_or(false)
    }

    pub fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        Ok(self.table_info(table)?.iter().any(|c| c.name == column))
    }

    pub fn drop_table(&self, table: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)), [])?;
        Ok(())
    }
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            // Close the connection before the file goes away.
            match Connection::open_in_memory() {
                Ok(mem) => {
                    let conn = std::mem::replace(self.conn.get_mut(), mem);
                    if let Err((_, e)) = conn.close() {
                        log::warn!("[ETL] Could not close scratch db: {}", e);
                    }
                }
                Err(e) => log::warn!("[ETL] Could not release scratch db: {}", e),
            }
            if let Err(e) = std::fs::remove_file(&path) {
                log::warn!("[ETL] Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(v: Value) -> Vec<Map<String, Value>> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn loads_heterogeneous_rows() {
        let db = ScratchDb::open_in_memory().unwrap();
        let table = db
            .load(
                &rows(json!([
                    {"id": 1, "name": "ana", "status": "ACTIVE"},
                    {"id": 2, "status": "INACTIVE", "tags": ["a", "b"], "admin": true}
                ])),
                Some("users"),
            )
            .unwrap();
        assert!(table.starts_with("t_users_"));
        assert_eq!(table.len(), "t_users_".len() + 8);

        let info = db.table_info(&table).unwrap();
        let names: Vec<&str> = info.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["uid", "admin", "id", "name", "status", "tags"]);
        assert_eq!(info[0].column_type, "TEXT");

        let data = db
            .query(&format!("SELECT id, name, tags, admin FROM \"{}\" ORDER BY id", table))
            .unwrap();
        assert_eq!(data[0]["name"], "ana");
        assert_eq!(data[0]["tags"], Value::Null);
        assert_eq!(data[1]["tags"], "[\"a\",\"b\"]");
        assert_eq!(data[1]["id"], 2);
        assert_eq!(data[1]["name"], Value::Null);
    }

    #[test]
    fn keys_differing_in_case_load_into_separate_columns() {
        let db = ScratchDb::open_in_memory().unwrap();
        let table = db
            .load(
                &rows(json!([
                    {"id": 1, "ID": "A-1", "UID": "x", "name": "a"},
                    {"id": 2, "name": "b"}
                ])),
                None,
            )
            .unwrap();

        let info = db.table_info(&table).unwrap();
        let names: Vec<&str> = info.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["uid", "ID", "id_2", "name"]);

        let data = db
            .query(&format!("SELECT uid, ID, id_2 FROM \"{}\" ORDER BY id_2", table))
            .unwrap();
        assert_eq!(data[0]["uid"], "x");
        assert_eq!(data[0]["ID"], "A-1");
        assert_eq!(data[0]["id_2"], 1);
        assert_eq!(data[1]["ID"], Value::Null);
        assert_eq!(data[1]["uid"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn rejects_writes_and_drops_tables() {
        let db = ScratchDb::open_in_memory().unwrap();
        let table = db.load(&rows(json!([{"a": 1}])), None).unwrap();
        assert!(table.starts_with("t_"));
        assert!(!db.is_read_only(&format!("DELETE FROM \"{}\"", table)));
        assert!(db.query(&format!("DELETE FROM \"{}\"", table)).is_err());

        db.drop_table(&table).unwrap();
        assert!(db.table_names().unwrap().is_empty());
    }

    #[test]
    fn blobs_come_back_as_base64() {
        let db = ScratchDb::open_in_memory().unwrap();
        let data = db.query("SELECT x'48656c6c6f' AS b").unwrap();
        assert_eq!(data[0]["b"], "SGVsbG8=");
    }

    #[test]
    fn file_is_fresh_per_open_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etl.db");
        std::fs::write(&path, b"stale").unwrap();

        let db = ScratchDb::open(&path).unwrap();
        db.load(&rows(json!([{"a": 1}])), None).unwrap();
        assert!(path.exists());
        drop(db);
        assert!(!path.exists());
    }
}
