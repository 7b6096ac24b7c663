//! Ad-hoc ETL: pull records through a tool or agent, load them into a
//! throwaway SQLite database and answer the request with one query.

pub mod flow;
pub mod intent;
pub mod schema;
pub mod sql;
pub mod store;

pub use flow::{EtlFlow, Fetcher, TABLE_PLACEHOLDER};
pub use intent::{classify, is_sql, Goal};
pub use schema::{infer_schema, infer_sqlite_type, unify_keys, Column, SqliteType};
pub use sql::SqlGenerator;
pub use store::ScratchDb;
