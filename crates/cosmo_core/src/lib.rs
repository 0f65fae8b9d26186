//! Persistence core for the cosmo planet/star catalog.
//!
//! Callers open a `UnitOfWork`, stage changes through its repositories and
//! make them durable with a single `commit`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use config::{ConfigError, ConfigurationProvider, ConnectionSettings};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::{AuditInfo, Auditable, Entity, EntityId, Planet, Star, ValidationError};
pub use repo::{
    PendingId, PlanetRepository, RepoError, RepoResult, Repository, SqlitePlanetRepository,
    SqliteRepository, SqliteStarRepository, StarRepository,
};
pub use service::catalog_service::{CatalogService, NewPlanet, NewStar};
pub use uow::{UnitOfWork, UnitOfWorkState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
