//! New card and new set submissions
//!
//! Proposals for records that do not exist in the live card database yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Moderation status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

/// A card proposed for addition to the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub flavor: String,
    #[validate(length(min = 1, message = "Type must not be empty"))]
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A card set proposed for addition to the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSet {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    /// Proposed set code
    #[serde(default)]
    pub set_id: String,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub block: String,
    #[validate(length(min = 1, message = "Type must not be empty"))]
    #[serde(rename = "type")]
    pub set_type: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub basic_land: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub common: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub uncommon: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub rare: i32,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub mythic_rare: i32,
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}
