//! Star entity.

use super::{AuditInfo, Auditable, Entity, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    /// Store-assigned; `None` until committed.
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub temperature_in_grade_celsius: i32,
    pub weight: i32,
    pub generates_energy: bool,
    pub audit: AuditInfo,
}

impl Star {
    /// Creates an unsaved star.
    pub fn new(
        name: impl Into<String>,
        temperature_in_grade_celsius: i32,
        weight: i32,
        generates_energy: bool,
        audit: AuditInfo,
    ) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            temperature_in_grade_celsius,
            weight,
            generates_energy,
            audit,
        }
    }
}

impl Auditable for Star {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

impl Entity for Star {
    const NAME: &'static str = "star";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.audit.validate()
    }
}
