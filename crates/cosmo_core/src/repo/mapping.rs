//! Row mapping between entities and their SQLite tables.
//!
//! # Invariants
//! - Every table has an `INTEGER PRIMARY KEY AUTOINCREMENT` column `id`.
//! - `COLUMNS` lists the non-identity columns in `to_values()` order.
//! - Boolean columns only hold `0` or `1`; anything else is invalid data.

use super::{RepoError, RepoResult};
use crate::model::{AuditInfo, Entity};
use rusqlite::types::Value;
use rusqlite::Row;

/// An entity that knows how to map itself onto a table row.
pub trait Persisted: Entity + Clone + 'static {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Column values in `COLUMNS` order.
    fn to_values(&self) -> Vec<Value>;

    /// Builds an entity from a row selected by `select_sql`.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

pub(crate) fn select_sql<T: Persisted>() -> String {
    format!("SELECT id, {} FROM {}", T::COLUMNS.join(", "), T::TABLE)
}

/// Values for `created_by, created_date, updated_by, updated_date`.
pub(crate) fn audit_values(audit: &AuditInfo) -> [Value; 4] {
    [
        Value::from(audit.created_by.clone()),
        Value::from(audit.created_date),
        Value::from(audit.updated_by.clone()),
        Value::from(audit.updated_date),
    ]
}

pub(crate) fn parse_audit(row: &Row<'_>) -> RepoResult<AuditInfo> {
    Ok(AuditInfo {
        created_by: row.get("created_by")?,
        updated_by: row.get("updated_by")?,
        created_date: row.get("created_date")?,
        updated_date: row.get("updated_date")?,
    })
}

pub(crate) fn parse_bool(row: &Row<'_>, table: &str, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {table}.{column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
