//! Live card database
//!
//! The card database owns the canonical card and set records. This service
//! reads them to diff proposals and sends field-level update commands once
//! a moderator accepts a change.

mod client;
#[cfg(test)]
mod memory;
mod types;

pub use client::HttpCardDatabase;
#[cfg(test)]
pub use memory::MemoryCardDatabase;
#[cfg(test)]
pub(crate) use types::fixtures;
pub use types::{Card, CardSet};

use crate::error::AppError;
use async_trait::async_trait;

/// Read and update access to the live card database
#[async_trait]
pub trait CardDatabase: Send + Sync {
    /// Fetch a card by multiverse id
    async fn get_card(&self, mvid: i32) -> Result<Card, AppError>;

    /// Fetch a card set by set code
    async fn get_set(&self, set_id: &str) -> Result<CardSet, AppError>;

    /// Apply one field of a card, authorized by the caller's token
    async fn update_card_field(
        &self,
        token: &str,
        mvid: i32,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError>;

    /// Apply one field of a card set, authorized by the caller's token
    async fn update_set_field(
        &self,
        token: &str,
        set_id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError>;
}
