//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic CRUD + predicate query contract (`Repository`).
//! - Stage mutations on a shared `Session`; never commit on their own.
//! - Host entity-specific query extensions (`PlanetRepository`,
//!   `StarRepository`) without touching the generic contract.
//!
//! # Invariants
//! - Write paths validate entities before anything is staged.
//! - Read paths reflect the store plus staged updates/removals.
//! - Session errors propagate unchanged; nothing here retries.

pub mod generic;
pub mod mapping;
pub mod planet_repo;
pub mod session;
pub mod star_repo;

use crate::config::ConfigError;
use crate::db::DbError;
use crate::model::{EntityId, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use generic::SqliteRepository;
pub use mapping::Persisted;
pub use planet_repo::{PlanetRepository, SqlitePlanetRepository};
pub use session::{PendingId, Session};
pub use star_repo::{SqliteStarRepository, StarRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error taxonomy surfaced by repositories and the unit of work.
#[derive(Debug)]
pub enum RepoError {
    /// Invalid entity passed to a staging operation; nothing was staged.
    Validation(ValidationError),
    /// A staged update/remove targeted an identity absent from the store.
    NotFound { entity: &'static str, id: EntityId },
    /// `get_single_or_default` matched more than one entity.
    MultipleResults { entity: &'static str, count: usize },
    /// The store could not be opened or reached.
    StorageUnavailable(DbError),
    /// Commit started but did not complete; nothing was made durable.
    TransactionFailed(rusqlite::Error),
    Config(ConfigError),
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Operational failures the caller may retry with a fresh unit of work.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::TransactionFailed(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MultipleResults { entity, count } => {
                write!(f, "expected at most one {entity}, found {count}")
            }
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::TransactionFailed(err) => write!(f, "transaction failed: {err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) => Some(err),
            Self::TransactionFailed(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ConfigError> for RepoError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// Generic storage operations for one entity type.
///
/// Staging operations (`add`, `update`, `remove` and their range variants)
/// only record intent; `UnitOfWork::commit` makes it durable. Reads return
/// snapshots ordered by ascending identity.
pub trait Repository<T> {
    /// Stages an insert. The entity must be valid and have no identity yet.
    /// The returned `PendingId` holds the store identity once committed.
    fn add(&self, entity: T) -> RepoResult<PendingId>;

    /// Stages several inserts. The whole batch is validated first, so a bad
    /// entity stages none of them. Empty input is a no-op.
    fn add_range<I>(&self, entities: I) -> RepoResult<Vec<PendingId>>
    where
        I: IntoIterator<Item = T>;

    /// Stages an update. Unknown identities fail at commit with `NotFound`.
    fn update(&self, entity: T) -> RepoResult<()>;

    fn update_range<I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = T>;

    /// Stages a delete. Unknown identities fail at commit with `NotFound`.
    fn remove(&self, entity: &T) -> RepoResult<()>;

    fn remove_range<'a, I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a;

    /// Point lookup; `None` when no row has this identity.
    fn get(&self, id: EntityId) -> RepoResult<Option<T>>;

    /// `None` for zero matches, the entity for one, `MultipleResults` beyond.
    fn get_single_or_default<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool;

    fn get_all(&self) -> RepoResult<Vec<T>>;

    fn find<P>(&self, predicate: P) -> RepoResult<Vec<T>>
    where
        P: Fn(&T) -> bool;
}
