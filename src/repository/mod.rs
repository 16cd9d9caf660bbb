//! Repository - persistence for everything this service owns
//!
//! Planeswalkers, submissions, change requests and collections. Records are
//! stored whole as documents; the moderation rules live in the models and
//! the moderation service, not here.

mod memory;
mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

use crate::change::{ChangeRequest, SetChangeRequest};
use crate::error::AppError;
use crate::models::{NewCard, NewSet, Planeswalker, SubmissionStatus, UserCard};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait Repository: Send + Sync {
    // Planeswalkers

    /// Store a new planeswalker; user names and emails are unique
    async fn add_planeswalker(&self, walker: Planeswalker) -> Result<Planeswalker, AppError>;
    async fn get_planeswalker(&self, id: Uuid) -> Result<Option<Planeswalker>, AppError>;
    async fn find_planeswalker(&self, user_name: &str) -> Result<Option<Planeswalker>, AppError>;
    async fn update_planeswalker(&self, walker: Planeswalker) -> Result<Planeswalker, AppError>;
    async fn remove_planeswalker(&self, id: Uuid) -> Result<(), AppError>;

    // New card and set submissions

    async fn add_card(&self, card: NewCard) -> Result<Uuid, AppError>;
    async fn get_card(&self, id: Uuid) -> Result<Option<NewCard>, AppError>;
    async fn get_new_cards(&self) -> Result<Vec<NewCard>, AppError>;
    async fn update_new_card_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewCard, AppError>;

    async fn add_set(&self, set: NewSet) -> Result<Uuid, AppError>;
    async fn get_set(&self, id: Uuid) -> Result<Option<NewSet>, AppError>;
    async fn get_new_sets(&self) -> Result<Vec<NewSet>, AppError>;
    async fn update_new_set_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewSet, AppError>;

    // Card change requests

    async fn add_card_change_request(&self, change: ChangeRequest) -> Result<Uuid, AppError>;
    async fn get_card_change_request(&self, id: Uuid) -> Result<Option<ChangeRequest>, AppError>;
    /// All requests for one card, oldest version first
    async fn get_card_change_requests(&self, mvid: i32) -> Result<Vec<ChangeRequest>, AppError>;
    /// All card requests, newest first
    async fn get_change_requests(&self) -> Result<Vec<ChangeRequest>, AppError>;
    async fn update_card_change_request(&self, change: ChangeRequest) -> Result<ChangeRequest, AppError>;

    // Set change requests

    async fn add_set_change_request(&self, change: SetChangeRequest) -> Result<Uuid, AppError>;
    async fn get_set_change_request(&self, id: Uuid) -> Result<Option<SetChangeRequest>, AppError>;
    /// All requests for one set, oldest version first
    async fn get_card_set_change_requests(&self, set_id: &str) -> Result<Vec<SetChangeRequest>, AppError>;
    /// All set requests, newest first
    async fn get_set_change_requests(&self) -> Result<Vec<SetChangeRequest>, AppError>;
    async fn update_set_change_request(&self, change: SetChangeRequest) -> Result<SetChangeRequest, AppError>;

    // Collections

    /// Add `amount` copies of a card; amounts accumulate per (user, mvid).
    /// A total past `i32::MAX` is a bad request and leaves the stored amount as is.
    async fn add_user_card(
        &self,
        user_id: Uuid,
        mvid: i32,
        card_set_id: &str,
        amount: i32,
    ) -> Result<UserCard, AppError>;
    /// One entry per owned card among `mvids`, ordered by mvid
    async fn get_user_cards(&self, user_id: Uuid, mvids: &[i32]) -> Result<Vec<UserCard>, AppError>;
    async fn get_user_cards_by_set(&self, user_id: Uuid, set_id: &str) -> Result<Vec<UserCard>, AppError>;
}

pub(crate) fn amount_out_of_range(mvid: i32) -> AppError {
    AppError::BadRequest(format!("Collection amount for card {} is out of range", mvid))
}
