//! In-memory repository
//!
//! Used when no DATABASE_URL is configured, and by the tests.

use crate::change::{ChangeRequest, SetChangeRequest};
use crate::error::AppError;
use crate::models::{NewCard, NewSet, Planeswalker, SubmissionStatus, UserCard};
use crate::repository::{amount_out_of_range, Repository};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryRepository {
    planeswalkers: Arc<RwLock<HashMap<Uuid, Planeswalker>>>,
    new_cards: Arc<RwLock<HashMap<Uuid, NewCard>>>,
    new_sets: Arc<RwLock<HashMap<Uuid, NewSet>>>,
    card_changes: Arc<RwLock<HashMap<Uuid, ChangeRequest>>>,
    set_changes: Arc<RwLock<HashMap<Uuid, SetChangeRequest>>>,
    user_cards: Arc<RwLock<HashMap<(Uuid, i32), UserCard>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn add_planeswalker(&self, walker: Planeswalker) -> Result<Planeswalker, AppError> {
        let mut planeswalkers = self.planeswalkers.write().await;

        if planeswalkers
            .values()
            .any(|p| p.user_name.eq_ignore_ascii_case(&walker.user_name))
        {
            return Err(AppError::Conflict("User name already taken".to_string()));
        }
        if planeswalkers
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&walker.email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        planeswalkers.insert(walker.id, walker.clone());
        Ok(walker)
    }

    async fn get_planeswalker(&self, id: Uuid) -> Result<Option<Planeswalker>, AppError> {
        Ok(self.planeswalkers.read().await.get(&id).cloned())
    }

    async fn find_planeswalker(&self, user_name: &str) -> Result<Option<Planeswalker>, AppError> {
        let planeswalkers = self.planeswalkers.read().await;
        Ok(planeswalkers
            .values()
            .find(|p| p.user_name.eq_ignore_ascii_case(user_name))
            .cloned())
    }

    async fn update_planeswalker(&self, mut walker: Planeswalker) -> Result<Planeswalker, AppError> {
        let mut planeswalkers = self.planeswalkers.write().await;
        if !planeswalkers.contains_key(&walker.id) {
            return Err(AppError::NotFound(format!("Planeswalker {} not found", walker.id)));
        }
        if planeswalkers
            .values()
            .any(|p| p.id != walker.id && p.email.eq_ignore_ascii_case(&walker.email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        walker.updated_at = Utc::now();
        planeswalkers.insert(walker.id, walker.clone());
        Ok(walker)
    }

    async fn remove_planeswalker(&self, id: Uuid) -> Result<(), AppError> {
        self.planeswalkers
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Planeswalker {} not found", id)))
    }

    async fn add_card(&self, mut card: NewCard) -> Result<Uuid, AppError> {
        if card.id.is_nil() {
            card.id = Uuid::new_v4();
        }
        let id = card.id;
        self.new_cards.write().await.insert(id, card);
        Ok(id)
    }

    async fn get_card(&self, id: Uuid) -> Result<Option<NewCard>, AppError> {
        Ok(self.new_cards.read().await.get(&id).cloned())
    }

    async fn get_new_cards(&self) -> Result<Vec<NewCard>, AppError> {
        let mut cards: Vec<NewCard> = self.new_cards.read().await.values().cloned().collect();
        cards.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cards)
    }

    async fn update_new_card_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewCard, AppError> {
        let mut cards = self.new_cards.write().await;
        let card = cards
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("New card {} not found", id)))?;
        card.status = status;
        Ok(card.clone())
    }

    async fn add_set(&self, mut set: NewSet) -> Result<Uuid, AppError> {
        if set.id.is_nil() {
            set.id = Uuid::new_v4();
        }
        let id = set.id;
        self.new_sets.write().await.insert(id, set);
        Ok(id)
    }

    async fn get_set(&self, id: Uuid) -> Result<Option<NewSet>, AppError> {
        Ok(self.new_sets.read().await.get(&id).cloned())
    }

    async fn get_new_sets(&self) -> Result<Vec<NewSet>, AppError> {
        let mut sets: Vec<NewSet> = self.new_sets.read().await.values().cloned().collect();
        sets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sets)
    }

    async fn update_new_set_status(&self, id: Uuid, status: SubmissionStatus) -> Result<NewSet, AppError> {
        let mut sets = self.new_sets.write().await;
        let set = sets
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("New set {} not found", id)))?;
        set.status = status;
        Ok(set.clone())
    }

    async fn add_card_change_request(&self, mut change: ChangeRequest) -> Result<Uuid, AppError> {
        if change.id.is_nil() {
            change.id = Uuid::new_v4();
        }
        let id = change.id;
        self.card_changes.write().await.insert(id, change);
        Ok(id)
    }

    async fn get_card_change_request(&self, id: Uuid) -> Result<Option<ChangeRequest>, AppError> {
        Ok(self.card_changes.read().await.get(&id).cloned())
    }

    async fn get_card_change_requests(&self, mvid: i32) -> Result<Vec<ChangeRequest>, AppError> {
        let mut changes: Vec<ChangeRequest> = self
            .card_changes
            .read()
            .await
            .values()
            .filter(|c| c.mvid == mvid)
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.lifecycle.version);
        Ok(changes)
    }

    async fn get_change_requests(&self) -> Result<Vec<ChangeRequest>, AppError> {
        let mut changes: Vec<ChangeRequest> = self.card_changes.read().await.values().cloned().collect();
        changes.sort_by(|a, b| b.lifecycle.created_at.cmp(&a.lifecycle.created_at));
        Ok(changes)
    }

    async fn update_card_change_request(&self, change: ChangeRequest) -> Result<ChangeRequest, AppError> {
        let mut changes = self.card_changes.write().await;
        if !changes.contains_key(&change.id) {
            return Err(AppError::NotFound(format!("Change request {} not found", change.id)));
        }
        changes.insert(change.id, change.clone());
        Ok(change)
    }

    async fn add_set_change_request(&self, mut change: SetChangeRequest) -> Result<Uuid, AppError> {
        if change.id.is_nil() {
            change.id = Uuid::new_v4();
        }
        let id = change.id;
        self.set_changes.write().await.insert(id, change);
        Ok(id)
    }

    async fn get_set_change_request(&self, id: Uuid) -> Result<Option<SetChangeRequest>, AppError> {
        Ok(self.set_changes.read().await.get(&id).cloned())
    }

    async fn get_card_set_change_requests(&self, set_id: &str) -> Result<Vec<SetChangeRequest>, AppError> {
        let mut changes: Vec<SetChangeRequest> = self
            .set_changes
            .read()
            .await
            .values()
            .filter(|c| c.set_id.eq_ignore_ascii_case(set_id))
            .cloned()
            .collect();
        changes.sort_by_key(|c| c.lifecycle.version);
        Ok(changes)
    }

    async fn get_set_change_requests(&self) -> Result<Vec<SetChangeRequest>, AppError> {
        let mut changes: Vec<SetChangeRequest> = self.set_changes.read().await.values().cloned().collect();
        changes.sort_by(|a, b| b.lifecycle.created_at.cmp(&a.lifecycle.created_at));
        Ok(changes)
    }

    async fn update_set_change_request(&self, change: SetChangeRequest) -> Result<SetChangeRequest, AppError> {
        let mut changes = self.set_changes.write().await;
        if !changes.contains_key(&change.id) {
            return Err(AppError::NotFound(format!("Set change request {} not found", change.id)));
        }
        changes.insert(change.id, change.clone());
        Ok(change)
    }

    async fn add_user_card(
        &self,
        user_id: Uuid,
        mvid: i32,
        card_set_id: &str,
        amount: i32,
    ) -> Result<UserCard, AppError> {
        let mut cards = self.user_cards.write().await;
        let current = cards.get(&(user_id, mvid)).map_or(0, |c| c.amount);
        let total = current.checked_add(amount).ok_or_else(|| amount_out_of_range(mvid))?;

        let entry = cards.entry((user_id, mvid)).or_insert_with(|| UserCard {
            user_id,
            mvid,
            card_set_id: card_set_id.to_string(),
            amount: 0,
        });
        entry.amount = total;
        Ok(entry.clone())
    }

    async fn get_user_cards(&self, user_id: Uuid, mvids: &[i32]) -> Result<Vec<UserCard>, AppError> {
        let cards = self.user_cards.read().await;
        Ok(mvids
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|mvid| cards.get(&(user_id, *mvid)).cloned())
            .collect())
    }

    async fn get_user_cards_by_set(&self, user_id: Uuid, set_id: &str) -> Result<Vec<UserCard>, AppError> {
        let cards = self.user_cards.read().await;
        let mut found: Vec<UserCard> = cards
            .values()
            .filter(|c| c.user_id == user_id && c.card_set_id.eq_ignore_ascii_case(set_id))
            .cloned()
            .collect();
        found.sort_by_key(|c| c.mvid);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carddb::fixtures;

    fn new_set(set_id: &str) -> NewSet {
        NewSet {
            id: Uuid::nil(),
            user_id: Uuid::new_v4(),
            set_id: set_id.to_string(),
            name: "Test set".to_string(),
            description: "Test set".to_string(),
            block: "Test".to_string(),
            set_type: "Test".to_string(),
            basic_land: 0,
            common: 0,
            uncommon: 0,
            rare: 0,
            mythic_rare: 0,
            status: SubmissionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_planeswalker_crud() {
        let repo = MemoryRepository::new();
        let walker = Planeswalker::new("mtgdb_tester".into(), "tester@test.com".into(), "hash".into());
        let id = repo.add_planeswalker(walker.clone()).await.unwrap().id;

        let found = repo.find_planeswalker("MTGDB_TESTER").await.unwrap().unwrap();
        assert_eq!(found.id, id);

        let mut changed = found.clone();
        changed.email = "change@email.com".to_string();
        let updated = repo.update_planeswalker(changed).await.unwrap();
        assert_eq!(updated.email, "change@email.com");

        repo.remove_planeswalker(id).await.unwrap();
        assert!(repo.get_planeswalker(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_name_conflicts() {
        let repo = MemoryRepository::new();
        repo.add_planeswalker(Planeswalker::new("jace".into(), "a@test.com".into(), "h".into()))
            .await
            .unwrap();
        let result = repo
            .add_planeswalker(Planeswalker::new("Jace".into(), "b@test.com".into(), "h".into()))
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_new_set_status_update() {
        let repo = MemoryRepository::new();
        let id = repo.add_set(new_set("TST3")).await.unwrap();

        let set = repo.update_new_set_status(id, SubmissionStatus::Declined).await.unwrap();
        assert_eq!(set.status, SubmissionStatus::Declined);
        assert_eq!(repo.get_new_sets().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_card_change_requests_by_mvid() {
        let repo = MemoryRepository::new();
        let card = fixtures::card();

        let mut original = ChangeRequest::map_card(&card);
        original.lifecycle.version = 0;
        let mut proposal = ChangeRequest::map_card(&card);
        proposal.lifecycle.version = 1;
        let mut other = ChangeRequest::map_card(&card);
        other.mvid = 1;

        repo.add_card_change_request(proposal).await.unwrap();
        repo.add_card_change_request(original).await.unwrap();
        repo.add_card_change_request(other).await.unwrap();

        let changes = repo.get_card_change_requests(2).await.unwrap();
        let versions: Vec<u32> = changes.iter().map(|c| c.lifecycle.version).collect();
        assert_eq!(versions, vec![0, 1]);
        assert_eq!(repo.get_change_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_unknown_change_request() {
        let repo = MemoryRepository::new();
        let change = ChangeRequest::map_card(&fixtures::card());
        let result = repo.update_card_change_request(change).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_user_cards_accumulate() {
        let repo = MemoryRepository::new();
        let user = Uuid::new_v4();

        repo.add_user_card(user, 1, "LEA", 1).await.unwrap();
        repo.add_user_card(user, 2, "LEA", 3).await.unwrap();
        let card = repo.add_user_card(user, 2, "LEA", 1).await.unwrap();
        assert_eq!(card.amount, 4);

        assert_eq!(repo.get_user_cards_by_set(user, "LEA").await.unwrap().len(), 2);
        assert_eq!(repo.get_user_cards(user, &[1, 2, 3]).await.unwrap().len(), 2);
        assert!(repo.get_user_cards_by_set(Uuid::new_v4(), "LEA").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_card_amount_overflow_rejected() {
        let repo = MemoryRepository::new();
        let user = Uuid::new_v4();

        repo.add_user_card(user, 7, "LEA", 2_000_000_000).await.unwrap();
        let result = repo.add_user_card(user, 7, "LEA", 2_000_000_000).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let cards = repo.get_user_cards(user, &[7]).await.unwrap();
        assert_eq!(cards[0].amount, 2_000_000_000);

        let result = repo.add_user_card(user, 8, "LEA", i32::MAX).await.unwrap();
        assert_eq!(result.amount, i32::MAX);
    }

    #[tokio::test]
    async fn test_user_cards_by_repeated_mvids() {
        let repo = MemoryRepository::new();
        let user = Uuid::new_v4();
        repo.add_user_card(user, 1, "LEA", 1).await.unwrap();
        repo.add_user_card(user, 2, "LEA", 2).await.unwrap();

        let cards = repo.get_user_cards(user, &[2, 2, 1, 2]).await.unwrap();
        let mvids: Vec<i32> = cards.iter().map(|c| c.mvid).collect();
        assert_eq!(mvids, vec![1, 2]);
    }
}
