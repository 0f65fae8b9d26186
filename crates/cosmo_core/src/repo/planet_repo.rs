//! Planet repository: generic CRUD plus planet-only queries.

use super::generic::SqliteRepository;
use super::mapping::{audit_values, bool_to_int, parse_audit, parse_bool, Persisted};
use super::{RepoError, RepoResult, Repository};
use crate::model::Planet;
use rusqlite::types::Value;
use rusqlite::Row;

/// Planet-specific queries layered over the generic contract.
pub trait PlanetRepository: Repository<Planet> {
    /// Planets whose atmosphere contains oxygen.
    ///
    /// Same snapshot and ordering semantics as
    /// `find(|planet| planet.has_oxygen)`.
    fn get_planets_has_oxygen(&self) -> RepoResult<Vec<Planet>>;
}

pub type SqlitePlanetRepository = SqliteRepository<Planet>;

impl PlanetRepository for SqliteRepository<Planet> {
    fn get_planets_has_oxygen(&self) -> RepoResult<Vec<Planet>> {
        self.find(|planet| planet.has_oxygen)
    }
}

impl Persisted for Planet {
    const TABLE: &'static str = "planet";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "has_oxygen",
        "diameter",
        "created_by",
        "created_date",
        "updated_by",
        "updated_date",
    ];

    fn to_values(&self) -> Vec<Value> {
        let mut values = vec![
            Value::from(self.name.clone()),
            Value::Integer(bool_to_int(self.has_oxygen)),
            Value::Integer(self.diameter),
        ];
        values.extend(audit_values(&self.audit));
        values
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let diameter: i64 = row.get("diameter")?;
        if diameter < 0 {
            return Err(RepoError::InvalidData(format!(
                "negative diameter `{diameter}` in planet.diameter"
            )));
        }

        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            has_oxygen: parse_bool(row, Self::TABLE, "has_oxygen")?,
            diameter,
            audit: parse_audit(row)?,
        })
    }
}
