//! Catalog use-case service.
//!
//! # Responsibility
//! - Stamp audit fields for the acting user before staging.
//! - Turn single-entity use-cases into one stage + commit round trip.
//!
//! # Invariants
//! - Each use-case commits exactly once; a failed commit leaves nothing
//!   durable.
//! - Service APIs never bypass repository validation.

use crate::model::{AuditInfo, Entity, EntityId, Planet, Star};
use crate::repo::{PendingId, RepoError, RepoResult, Repository};
use crate::uow::UnitOfWork;
use log::info;

/// Input for registering a planet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlanet {
    pub name: String,
    pub has_oxygen: bool,
    pub diameter: i64,
}

/// Input for registering a star.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStar {
    pub name: String,
    pub temperature_in_grade_celsius: i32,
    pub weight: i32,
    pub generates_energy: bool,
}

/// Catalog operations performed on behalf of one actor.
pub struct CatalogService<'uow> {
    uow: &'uow UnitOfWork,
    actor: String,
}

impl<'uow> CatalogService<'uow> {
    pub fn new(uow: &'uow UnitOfWork, actor: impl Into<String>) -> Self {
        Self {
            uow,
            actor: actor.into(),
        }
    }

    /// Adds and commits a planet; returns its store identity.
    pub fn register_planet(&self, request: NewPlanet) -> RepoResult<EntityId> {
        let planet = Planet::new(
            request.name,
            request.has_oxygen,
            request.diameter,
            AuditInfo::now(self.actor.as_str()),
        );
        let id = self.uow.planets().add(planet)?;
        self.commit("register_planet")?;
        assigned_identity(Planet::NAME, &id)
    }

    /// Adds and commits a star; returns its store identity.
    pub fn register_star(&self, request: NewStar) -> RepoResult<EntityId> {
        let star = Star::new(
            request.name,
            request.temperature_in_grade_celsius,
            request.weight,
            request.generates_energy,
            AuditInfo::now(self.actor.as_str()),
        );
        let id = self.uow.stars().add(star)?;
        self.commit("register_star")?;
        assigned_identity(Star::NAME, &id)
    }

    /// Renames a stored planet and records the actor as its last editor.
    pub fn rename_planet(&self, id: EntityId, name: impl Into<String>) -> RepoResult<Planet> {
        let mut planet = self
            .uow
            .planets()
            .get(id)?
            .ok_or(RepoError::NotFound {
                entity: Planet::NAME,
                id,
            })?;
        planet.name = Some(name.into());
        planet.audit.touch_now(self.actor.as_str());

        self.uow.planets().update(planet.clone())?;
        self.commit("rename_planet")?;
        Ok(planet)
    }

    fn commit(&self, operation: &str) -> RepoResult<usize> {
        let rows = self.uow.commit()?;
        info!("event=catalog_commit module=service status=ok op={operation} rows={rows}");
        Ok(rows)
    }
}

fn assigned_identity(entity: &'static str, id: &PendingId) -> RepoResult<EntityId> {
    id.get().ok_or_else(|| {
        RepoError::InvalidData(format!("{entity} committed without a store identity"))
    })
}
