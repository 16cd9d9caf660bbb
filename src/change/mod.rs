//! Change request module - the heart of card moderation
//!
//! Models proposed edits to cards and sets, computes which fields a proposal
//! changes, and resolves the review state of each field.

mod diff;
mod field;
mod lifecycle;
mod mapping;
mod models;
mod validate;

pub use diff::{fields_changed, set_fields_changed};
pub use field::{CardField, FieldState, SetField};
pub use lifecycle::{ChangeStatus, Lifecycle};
pub use models::*;
pub use validate::{check, RuleViolation};
