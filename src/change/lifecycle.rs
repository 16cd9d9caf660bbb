//! Moderation lifecycle shared by card and set change requests
//!
//! Holds the version, status and field bookkeeping lists, and derives the
//! review state of each field from them.

use crate::change::FieldState;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Change request status in the moderation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// Waiting for a moderator
    #[default]
    Pending,
    /// At least one field was applied to the live record
    Accepted,
    /// Rejected by a moderator
    Declined,
    /// Finished; no further changes allowed
    Closed,
}

impl ChangeStatus {
    /// Whether a request in this status may move to `next`
    pub fn can_transition_to(&self, next: ChangeStatus) -> bool {
        use ChangeStatus::*;
        match (self, next) {
            (Closed, _) => false,
            (Pending, Accepted | Declined | Closed) => true,
            (Accepted, Closed) => true,
            (Declined, Closed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeStatus::Pending => write!(f, "Pending"),
            ChangeStatus::Accepted => write!(f, "Accepted"),
            ChangeStatus::Declined => write!(f, "Declined"),
            ChangeStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// Version, status and per-field bookkeeping of a change request.
///
/// `version == 0` is the snapshot of the live record; every later version is
/// a proposal whose `fields_updated` were computed against the live record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle<F> {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub status: ChangeStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
    #[serde(default = "Vec::new")]
    pub fields_updated: Vec<F>,
    #[serde(default = "Vec::new")]
    pub changes_committed: Vec<F>,
    #[serde(default = "Vec::new")]
    pub changes_overwritten: Vec<F>,
}

impl<F> Default for Lifecycle<F> {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: 0,
            status: ChangeStatus::Pending,
            created_at: now,
            modified_at: now,
            fields_updated: Vec::new(),
            changes_committed: Vec::new(),
            changes_overwritten: Vec::new(),
        }
    }
}

impl<F> Lifecycle<F>
where
    F: Copy + PartialEq + std::fmt::Display,
{
    pub fn is_field_changed(&self, field: F) -> bool {
        self.fields_updated.contains(&field)
    }

    pub fn is_accepted(&self, field: F) -> bool {
        self.changes_committed.contains(&field)
    }

    pub fn is_overwritten(&self, field: F) -> bool {
        self.changes_overwritten.contains(&field)
    }

    /// Resolve the review state of one field; the first matching rule wins.
    pub fn field_state(&self, field: F) -> FieldState {
        if self.version != 0 && !self.is_field_changed(field) {
            FieldState::NoChange
        } else if self.status == ChangeStatus::Closed {
            FieldState::Closed
        } else if self.is_overwritten(field) {
            FieldState::Overwritten
        } else if self.is_accepted(field) {
            FieldState::Accepted
        } else if self.version != 0 && self.is_field_changed(field) {
            FieldState::Changed
        } else {
            FieldState::Unresolved
        }
    }

    /// Move to a new status, enforcing the workflow transitions
    pub fn transition(&mut self, next: ChangeStatus) -> Result<(), AppError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Cannot move a {} change request to {}",
                self.status, next
            )));
        }
        self.status = next;
        self.modified_at = Utc::now();
        Ok(())
    }

    /// Record that `field` was applied to the live record
    pub fn commit(&mut self, field: F) -> Result<(), AppError> {
        match self.status {
            ChangeStatus::Closed | ChangeStatus::Declined => {
                return Err(AppError::Conflict(format!(
                    "Cannot accept fields of a {} change request",
                    self.status
                )));
            }
            ChangeStatus::Pending | ChangeStatus::Accepted => {}
        }
        if !self.is_field_changed(field) {
            return Err(AppError::BadRequest(format!(
                "Field '{}' is not changed by this request",
                field
            )));
        }
        if !self.is_accepted(field) {
            self.changes_committed.push(field);
        }
        self.status = ChangeStatus::Accepted;
        self.modified_at = Utc::now();
        Ok(())
    }

    /// Mark `field` as superseded by another accepted change.
    ///
    /// Returns false when the field does not apply: the request is closed,
    /// never proposed the field, or already had it accepted.
    pub fn overwrite(&mut self, field: F) -> bool {
        if self.status == ChangeStatus::Closed
            || !self.is_field_changed(field)
            || self.is_accepted(field)
            || self.is_overwritten(field)
        {
            return false;
        }
        self.changes_overwritten.push(field);
        self.modified_at = Utc::now();
        true
    }
}
