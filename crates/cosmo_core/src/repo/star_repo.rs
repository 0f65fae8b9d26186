//! Star repository.
//!
//! No star-specific queries yet; the trait exists so the unit of work hands
//! out a star accessor that can grow domain queries without touching
//! `Repository`.

use super::generic::SqliteRepository;
use super::mapping::{audit_values, bool_to_int, parse_audit, parse_bool, Persisted};
use super::{RepoResult, Repository};
use crate::model::Star;
use rusqlite::types::Value;
use rusqlite::Row;

pub trait StarRepository: Repository<Star> {}

pub type SqliteStarRepository = SqliteRepository<Star>;

impl StarRepository for SqliteRepository<Star> {}

impl Persisted for Star {
    const TABLE: &'static str = "star";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "temperature_in_grade_celsius",
        "weight",
        "generates_energy",
        "created_by",
        "created_date",
        "updated_by",
        "updated_date",
    ];

    fn to_values(&self) -> Vec<Value> {
        let mut values = vec![
            Value::from(self.name.clone()),
            Value::from(self.temperature_in_grade_celsius),
            Value::from(self.weight),
            Value::Integer(bool_to_int(self.generates_energy)),
        ];
        values.extend(audit_values(&self.audit));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            temperature_in_grade_celsius: row.get("temperature_in_grade_celsius")?,
            weight: row.get("weight")?,
            generates_energy: parse_bool(row, Self::TABLE, "generates_energy")?,
            audit: parse_audit(row)?,
        })
    }
}
