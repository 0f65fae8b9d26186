//! Entity model for the planet/star catalog.
//!
//! # Responsibility
//! - Define the plain records persisted by the repositories.
//! - Define the audit trail shared by every persisted entity.
//!
//! # Invariants
//! - Identity is store-assigned; `None` until the first successful commit.
//! - Identities are never reused once assigned.
//! - Models carry data and invariants only, no persistence behavior.

pub mod audit;
pub mod planet;
pub mod star;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use audit::{now_epoch_ms, AuditInfo, Auditable, MAX_ACTOR_CHARS};
pub use planet::Planet;
pub use star::Star;

/// Opaque surrogate key assigned by the store.
pub type EntityId = i64;

/// Identity-bearing record persisted in the store.
pub trait Entity: Auditable {
    /// Human-readable entity name used in errors and log events.
    const NAME: &'static str;

    /// Store-assigned identity, `None` while staged but not yet committed.
    fn id(&self) -> Option<EntityId>;

    /// Checks entity invariants, including the audit trail.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Invariant violations detected before anything reaches the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `update`/`remove` needs an identity the entity does not have yet.
    MissingIdentity { entity: &'static str },
    /// `add` got an entity that already carries a store identity.
    UnexpectedIdentity { entity: &'static str, id: EntityId },
    NegativeDiameter(i64),
    /// A new record has no `created_by`.
    MissingCreatedBy,
    BlankCreatedBy,
    ActorTooLong { field: &'static str, chars: usize },
    UpdatedBeforeCreated { created_date: i64, updated_date: i64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity { entity } => {
                write!(f, "{entity} has no identity; it must be committed first")
            }
            Self::UnexpectedIdentity { entity, id } => {
                write!(f, "{entity} already has identity {id}; identities are store-assigned")
            }
            Self::NegativeDiameter(value) => {
                write!(f, "diameter must be non-negative, got {value}")
            }
            Self::MissingCreatedBy => write!(f, "created_by is required for new records"),
            Self::BlankCreatedBy => write!(f, "created_by must not be blank"),
            Self::ActorTooLong { field, chars } => write!(
                f,
                "{field} must be at most {MAX_ACTOR_CHARS} characters, got {chars}"
            ),
            Self::UpdatedBeforeCreated {
                created_date,
                updated_date,
            } => write!(
                f,
                "updated_date {updated_date} is earlier than created_date {created_date}"
            ),
        }
    }
}

impl Error for ValidationError {}
