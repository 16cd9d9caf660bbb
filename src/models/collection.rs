//! Planeswalker card collections

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How many copies of a card a planeswalker owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub user_id: Uuid,
    pub mvid: i32,
    pub card_set_id: String,
    pub amount: i32,
}
