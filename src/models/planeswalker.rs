//! Planeswalker (registered user) models

use crate::auth::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Registered user of the card database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Planeswalker {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Planeswalker {
    pub fn new(user_name: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_name,
            email,
            password_hash,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a planeswalker (without sensitive data)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Planeswalker> for Profile {
    fn from(walker: &Planeswalker) -> Self {
        Self {
            id: walker.id,
            user_name: walker.user_name.clone(),
            email: walker.email.clone(),
            role: walker.role,
            created_at: walker.created_at,
        }
    }
}

/// Profile update payload
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}
