//! In-memory card database for tests

use crate::carddb::{Card, CardDatabase, CardSet};
use crate::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Recorded update command: (token, record key, field, value)
pub type RecordedUpdate = (String, String, String, Option<String>);

/// Card database stand-in that serves fixed records and records updates
#[derive(Clone, Default)]
pub struct MemoryCardDatabase {
    cards: Arc<Mutex<HashMap<i32, Card>>>,
    sets: Arc<Mutex<HashMap<String, CardSet>>>,
    updates: Arc<Mutex<Vec<RecordedUpdate>>>,
}

impl MemoryCardDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card(self, card: Card) -> Self {
        self.cards.lock().unwrap().insert(card.id, card);
        self
    }

    pub fn with_set(self, set: CardSet) -> Self {
        self.sets.lock().unwrap().insert(set.id.clone(), set);
        self
    }

    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl CardDatabase for MemoryCardDatabase {
    async fn get_card(&self, mvid: i32) -> Result<Card, AppError> {
        self.cards
            .lock()
            .unwrap()
            .get(&mvid)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Card {} not found", mvid)))
    }

    async fn get_set(&self, set_id: &str) -> Result<CardSet, AppError> {
        self.sets
            .lock()
            .unwrap()
            .get(set_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Card set {} not found", set_id)))
    }

    async fn update_card_field(
        &self,
        token: &str,
        mvid: i32,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError> {
        if !self.cards.lock().unwrap().contains_key(&mvid) {
            return Err(AppError::NotFound(format!("Card {} not found", mvid)));
        }
        self.updates.lock().unwrap().push((
            token.to_string(),
            mvid.to_string(),
            field.to_string(),
            value.map(str::to_string),
        ));
        Ok(())
    }

    async fn update_set_field(
        &self,
        token: &str,
        set_id: &str,
        field: &str,
        value: Option<&str>,
    ) -> Result<(), AppError> {
        if !self.sets.lock().unwrap().contains_key(set_id) {
            return Err(AppError::NotFound(format!("Card set {} not found", set_id)));
        }
        self.updates.lock().unwrap().push((
            token.to_string(),
            set_id.to_string(),
            field.to_string(),
            value.map(str::to_string),
        ));
        Ok(())
    }
}
