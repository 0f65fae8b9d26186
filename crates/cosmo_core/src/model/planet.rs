//! Planet entity.

use super::{AuditInfo, Auditable, Entity, EntityId, ValidationError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Store-assigned; `None` until committed.
    pub id: Option<EntityId>,
    pub name: Option<String>,
    pub has_oxygen: bool,
    /// Kilometres. Never negative.
    pub diameter: i64,
    pub audit: AuditInfo,
}

impl Planet {
    /// Creates an unsaved planet.
    pub fn new(name: impl Into<String>, has_oxygen: bool, diameter: i64, audit: AuditInfo) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            has_oxygen,
            diameter,
            audit,
        }
    }
}

impl Auditable for Planet {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

impl Entity for Planet {
    const NAME: &'static str = "planet";

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.diameter < 0 {
            return Err(ValidationError::NegativeDiameter(self.diameter));
        }
        self.audit.validate()
    }
}
