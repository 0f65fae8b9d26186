//! Audit trail composed into every persisted entity.
//!
//! # Invariants
//! - `created_by`/`created_date` are set once before the first `add`.
//!   Rows written before auditing existed have no creator; that absence is
//!   kept as-is.
//! - `updated_by`/`updated_date` are absent until the first mutation.
//! - Actor names are at most 256 characters.
//!
//! Population is the caller's job; the persistence layer only validates.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Column width of `created_by`/`updated_by`.
pub const MAX_ACTOR_CHARS: usize = 256;

/// Who created/last changed a record, and when (Unix epoch milliseconds).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_date: i64,
    pub updated_date: Option<i64>,
}

impl AuditInfo {
    pub fn new(created_by: impl Into<String>, created_date: i64) -> Self {
        Self {
            created_by: Some(created_by.into()),
            updated_by: None,
            created_date,
            updated_date: None,
        }
    }

    /// Creation stamp for `created_by` at the current wall-clock time.
    pub fn now(created_by: impl Into<String>) -> Self {
        Self::new(created_by, now_epoch_ms())
    }

    /// Records a mutation by `updated_by` at `updated_date`.
    pub fn touch(&mut self, updated_by: impl Into<String>, updated_date: i64) {
        self.updated_by = Some(updated_by.into());
        self.updated_date = Some(updated_date);
    }

    pub fn touch_now(&mut self, updated_by: impl Into<String>) {
        self.touch(updated_by, now_epoch_ms());
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(created_by) = self.created_by.as_deref() {
            if created_by.trim().is_empty() {
                return Err(ValidationError::BlankCreatedBy);
            }
            check_actor("created_by", created_by)?;
        }
        if let Some(updated_by) = self.updated_by.as_deref() {
            check_actor("updated_by", updated_by)?;
        }
        if let Some(updated_date) = self.updated_date {
            if updated_date < self.created_date {
                return Err(ValidationError::UpdatedBeforeCreated {
                    created_date: self.created_date,
                    updated_date,
                });
            }
        }
        Ok(())
    }

    /// New records must name their creator.
    pub fn require_creator(&self) -> Result<(), ValidationError> {
        if self.created_by.is_none() {
            return Err(ValidationError::MissingCreatedBy);
        }
        Ok(())
    }
}

/// Access to the audit trail of an entity.
pub trait Auditable {
    fn audit(&self) -> &AuditInfo;
    fn audit_mut(&mut self) -> &mut AuditInfo;
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}

fn check_actor(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let chars = value.chars().count();
    if chars > MAX_ACTOR_CHARS {
        return Err(ValidationError::ActorTooLong { field, chars });
    }
    Ok(())
}
