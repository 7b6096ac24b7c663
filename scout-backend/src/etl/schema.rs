//! Column inference for JSON records.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};

/// Synthetic primary column added to every scratch table.
pub const UID_COLUMN: &str = "uid";

/// Keys matching `uid` in any case feed the synthetic column.
pub fn is_uid_key(key: &str) -> bool {
    key.eq_ignore_ascii_case(UID_COLUMN)
}

/// One table column and the record key its values come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    /// Unique ignoring ASCII case, as SQLite identifiers are.
    pub name: String,
    pub ty: SqliteType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteType {
    Integer,
    Real,
    Text,
}

impl SqliteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqliteType::Integer => "INTEGER",
            SqliteType::Real => "REAL",
            SqliteType::Text => "TEXT",
        }
    }
}

pub fn infer_sqlite_type(value: Option<&Value>) -> SqliteType {
    match value {
        None | Some(Value::Null) => SqliteType::Text,
        Some(Value::Bool(_)) => SqliteType::Integer,
        Some(Value::Number(n)) if n.is_i64() || n.is_u64() => SqliteType::Integer,
        Some(Value::Number(_)) => SqliteType::Real,
        Some(_) => SqliteType::Text,
    }
}

/// Sorted union of keys across all records.
pub fn unify_keys(rows: &[Map<String, Value>]) -> Vec<String> {
    rows.iter()
        .flat_map(|r| r.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Columns for `rows`: the union of keys, typed from the first non-empty record.
/// Does not include the `uid` column. Keys that differ only in case get a
/// `_2`, `_3`, ... suffix.
pub fn infer_schema(rows: &[Map<String, Value>]) -> Vec<Column> {
    let sample = rows.iter().find(|r| !r.is_empty());
    let mut taken: HashSet<String> = HashSet::from([UID_COLUMN.to_string()]);
    unify_keys(rows)
        .into_iter()
        .filter(|k| !is_uid_key(k))
        .map(|key| {
            let mut name = key.clone();
            let mut n = 2;
            while !taken.insert(name.to_ascii_lowercase()) {
                name = format!("{}_{}", key, n);
                n += 1;
            }
            let ty = infer_sqlite_type(sample.and_then(|s| s.get(&key)));
            Column { key, name, ty }
        })
        .collect()
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
    fn infers_scalar_types() {
        assert_eq!(infer_sqlite_type(Some(&json!(null))), SqliteType::Text);
        assert_eq!(infer_sqlite_type(Some(&json!(true))), SqliteType::Integer);
        assert_eq!(infer_sqlite_type(Some(&json!(7))), SqliteType::Integer);
        assert_eq!(infer_sqlite_type(Some(&json!(7.5))), SqliteType::Real);
        assert_eq!(infer_sqlite_type(Some(&json!("x"))), SqliteType::Text);
        assert_eq!(infer_sqlite_type(Some(&json!({"a": 1}))), SqliteType::Text);
        assert_eq!(infer_sqlite_type(None), SqliteType::Text);
    }

    #[test]
    fn columns_are_union_of_keys_typed_from_first_non_empty_record() {
        let rows = rows(json!([
            {},
            {"id": 1, "score": 2.5},
            {"id": 2, "name": "b", "tags": ["x"]}
        ]));
        let schema: Vec<(String, SqliteType)> =
            infer_schema(&rows).into_iter().map(|c| (c.name, c.ty)).collect();
        assert_eq!(
            schema,
            vec![
                ("id".to_string(), SqliteType::Integer),
                ("name".to_string(), SqliteType::Text),
                ("score".to_string(), SqliteType::Real),
                ("tags".to_string(), SqliteType::Text),
            ]
        );
    }

    #[test]
    fn case_variants_get_distinct_column_names() {
        let rows = rows(json!([{"id": 1, "ID": "A-1", "Uid": "u-1", "id_2": true}]));
        let schema: Vec<(String, String)> =
            infer_schema(&rows).into_iter().map(|c| (c.key, c.name)).collect();
        assert_eq!(
            schema,
            vec![
                ("ID".to_string(), "ID".to_string()),
                ("id".to_string(), "id_2".to_string()),
                ("id_2".to_string(), "id_2_2".to_string()),
            ]
        );
    }
}
