//! Moderation workflow
//!
//! Ties the change model to storage and the live card database: proposals
//! are diffed against the live record on submission, moderators accept
//! individual fields (which pushes them to the live record and marks the
//! same field overwritten on competing proposals), and statuses move
//! through the request lifecycle.

use crate::carddb::CardDatabase;
use crate::change::{
    check, fields_changed, set_fields_changed, CardField, ChangeRequest, ChangeStatus, FieldState,
    Lifecycle, SetChangeRequest, SetField,
};
use crate::error::AppError;
use crate::repository::Repository;
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tracing::{debug, info};
use uuid::Uuid;

const BASELINE_COMMENT: &str = "Original record";

/// Review state of one field of a request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReview<F> {
    pub field: F,
    pub state: FieldState,
    pub proposed: Option<String>,
    pub current: Option<String>,
}

/// A change request together with the state of every tracked field
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReview<T, F> {
    pub request: T,
    pub fields: Vec<FieldReview<F>>,
}

fn review_fields<F>(
    lifecycle: &Lifecycle<F>,
    proposed: impl Fn(F) -> Result<Option<String>, AppError>,
    current: impl Fn(F) -> Result<Option<String>, AppError>,
) -> Result<Vec<FieldReview<F>>, AppError>
where
    F: IntoEnumIterator + Copy + PartialEq + Display,
{
    F::iter()
        .map(|field| {
            Ok::<_, AppError>(FieldReview {
                field,
                state: lifecycle.field_state(field),
                proposed: proposed(field)?,
                current: current(field)?,
            })
        })
        .collect()
}

fn with_status<T>(requests: Vec<T>, status: Option<ChangeStatus>, of: impl Fn(&T) -> ChangeStatus) -> Vec<T> {
    match status {
        Some(status) => requests.into_iter().filter(|r| of(r) == status).collect(),
        None => requests,
    }
}

pub struct ModerationService {
    repository: Arc<dyn Repository>,
    card_db: Arc<dyn CardDatabase>,
}

impl ModerationService {
    pub fn new(repository: Arc<dyn Repository>, card_db: Arc<dyn CardDatabase>) -> Self {
        Self { repository, card_db }
    }

    // ===== Card change requests =====

    /// Validate and diff a proposal against the live card, then store it as
    /// the next version. The first proposal for a card also stores the live
    /// record as version 0.
    pub async fn submit_card_change(
        &self,
        user_id: Uuid,
        mvid: i32,
        mut proposal: ChangeRequest,
    ) -> Result<ChangeRequest, AppError> {
        proposal.mvid = mvid;
        check(&proposal).map_err(AppError::InvalidChange)?;

        let card = self.card_db.get_card(mvid).await?;
        let fields_updated = fields_changed(&card, &proposal);
        if fields_updated.is_empty() {
            return Err(AppError::BadRequest("No fields changed".to_string()));
        }

        let mut existing = self.repository.get_card_change_requests(mvid).await?.len();
        if existing == 0 {
            let mut baseline = ChangeRequest::map_card(&card);
            baseline.user_id = user_id;
            baseline.comment = BASELINE_COMMENT.to_string();
            baseline.lifecycle.status = ChangeStatus::Accepted;
            self.repository.add_card_change_request(baseline).await?;
            debug!(mvid, "Stored baseline for card");
            existing = 1;
        }

        proposal.id = Uuid::new_v4();
        proposal.user_id = user_id;
        proposal.lifecycle = Lifecycle {
            version: existing as u32,
            fields_updated,
            ..Default::default()
        };
        self.repository.add_card_change_request(proposal.clone()).await?;

        info!(
            mvid,
            version = proposal.lifecycle.version,
            fields = proposal.lifecycle.fields_updated.len(),
            "Card change submitted"
        );
        Ok(proposal)
    }

    pub async fn get_card_change(&self, id: Uuid) -> Result<ChangeRequest, AppError> {
        self.repository
            .get_card_change_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Change request {} not found", id)))
    }

    pub async fn card_changes(&self, mvid: i32) -> Result<Vec<ChangeRequest>, AppError> {
        self.repository.get_card_change_requests(mvid).await
    }

    pub async fn all_card_changes(&self, status: Option<ChangeStatus>) -> Result<Vec<ChangeRequest>, AppError> {
        let requests = self.repository.get_change_requests().await?;
        Ok(with_status(requests, status, |r| r.lifecycle.status))
    }

    /// The request with proposed and live values for every tracked field
    pub async fn review_card_change(&self, id: Uuid) -> Result<ChangeReview<ChangeRequest, CardField>, AppError> {
        let request = self.get_card_change(id).await?;
        let live = ChangeRequest::map_card(&self.card_db.get_card(request.mvid).await?);

        let fields = review_fields(
            &request.lifecycle,
            |f| request.field_value(f),
            |f| live.field_value(f),
        )?;
        Ok(ChangeReview { request, fields })
    }

    /// Apply one proposed field to the live card
    pub async fn accept_card_field(
        &self,
        token: &str,
        id: Uuid,
        field: CardField,
    ) -> Result<ChangeRequest, AppError> {
        let mut request = self.get_card_change(id).await?;

        // Check the commit is allowed before touching the live record
        let mut lifecycle = request.lifecycle.clone();
        lifecycle.commit(field)?;

        let value = request.field_value(field)?;
        self.card_db
            .update_card_field(token, request.mvid, field.as_ref(), value.as_deref())
            .await?;

        request.lifecycle = lifecycle;
        let request = self.repository.update_card_change_request(request).await?;

        let mut overwritten = 0;
        for mut sibling in self.repository.get_card_change_requests(request.mvid).await? {
            if sibling.id != request.id && sibling.lifecycle.overwrite(field) {
                self.repository.update_card_change_request(sibling).await?;
                overwritten += 1;
            }
        }

        info!(%id, mvid = request.mvid, %field, overwritten, "Card field accepted");
        Ok(request)
    }

    pub async fn update_card_change_status(&self, id: Uuid, status: ChangeStatus) -> Result<ChangeRequest, AppError> {
        let mut request = self.get_card_change(id).await?;
        request.lifecycle.transition(status)?;
        info!(%id, %status, "Card change status updated");
        self.repository.update_card_change_request(request).await
    }

    // ===== Set change requests =====

    pub async fn submit_set_change(
        &self,
        user_id: Uuid,
        set_id: &str,
        mut proposal: SetChangeRequest,
    ) -> Result<SetChangeRequest, AppError> {
        proposal.set_id = set_id.to_string();
        check(&proposal).map_err(AppError::InvalidChange)?;

        let set = self.card_db.get_set(set_id).await?;
        let fields_updated = set_fields_changed(&set, &proposal);
        if fields_updated.is_empty() {
            return Err(AppError::BadRequest("No fields changed".to_string()));
        }

        let mut existing = self.repository.get_card_set_change_requests(set_id).await?.len();
        if existing == 0 {
            let mut baseline = SetChangeRequest::map_set(&set);
            baseline.user_id = user_id;
            baseline.comment = BASELINE_COMMENT.to_string();
            baseline.lifecycle.status = ChangeStatus::Accepted;
            self.repository.add_set_change_request(baseline).await?;
            debug!(set_id, "Stored baseline for set");
            existing = 1;
        }

        proposal.id = Uuid::new_v4();
        proposal.user_id = user_id;
        proposal.lifecycle = Lifecycle {
            version: existing as u32,
            fields_updated,
            ..Default::default()
        };
        self.repository.add_set_change_request(proposal.clone()).await?;

        info!(
            set_id,
            version = proposal.lifecycle.version,
            fields = proposal.lifecycle.fields_updated.len(),
            "Set change submitted"
        );
        Ok(proposal)
    }

    pub async fn get_set_change(&self, id: Uuid) -> Result<SetChangeRequest, AppError> {
        self.repository
            .get_set_change_request(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Set change request {} not found", id)))
    }

    pub async fn set_changes(&self, set_id: &str) -> Result<Vec<SetChangeRequest>, AppError> {
        self.repository.get_card_set_change_requests(set_id).await
    }

    pub async fn all_set_changes(&self, status: Option<ChangeStatus>) -> Result<Vec<SetChangeRequest>, AppError> {
        let requests = self.repository.get_set_change_requests().await?;
        Ok(with_status(requests, status, |r| r.lifecycle.status))
    }

    pub async fn review_set_change(&self, id: Uuid) -> Result<ChangeReview<SetChangeRequest, SetField>, AppError> {
        let request = self.get_set_change(id).await?;
        let live = SetChangeRequest::map_set(&self.card_db.get_set(&request.set_id).await?);

        let fields = review_fields(
            &request.lifecycle,
            |f| Ok(request.field_value(f)),
            |f| Ok(live.field_value(f)),
        )?;
        Ok(ChangeReview { request, fields })
    }

    pub async fn accept_set_field(
        &self,
        token: &str,
        id: Uuid,
        field: SetField,
    ) -> Result<SetChangeRequest, AppError> {
        let mut request = self.get_set_change(id).await?;

        let mut lifecycle = request.lifecycle.clone();
        lifecycle.commit(field)?;

        let value = request.field_value(field);
        self.card_db
            .update_set_field(token, &request.set_id, field.as_ref(), value.as_deref())
            .await?;

        request.lifecycle = lifecycle;
        let request = self.repository.update_set_change_request(request).await?;

        let mut overwritten = 0;
        for mut sibling in self.repository.get_card_set_change_requests(&request.set_id).await? {
            if sibling.id != request.id && sibling.lifecycle.overwrite(field) {
                self.repository.update_set_change_request(sibling).await?;
                overwritten += 1;
            }
        }

        info!(%id, set_id = %request.set_id, %field, overwritten, "Set field accepted");
        Ok(request)
    }

    pub async fn update_set_change_status(&self, id: Uuid, status: ChangeStatus) -> Result<SetChangeRequest, AppError> {
        let mut request = self.get_set_change(id).await?;
        request.lifecycle.transition(status)?;
        info!(%id, %status, "Set change status updated");
        self.repository.update_set_change_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carddb::{fixtures, MemoryCardDatabase};
    use crate::repository::MemoryRepository;
    use pretty_assertions::assert_eq;

    fn service() -> (ModerationService, MemoryCardDatabase) {
        let card_db = MemoryCardDatabase::new()
            .with_card(fixtures::card())
            .with_set(fixtures::card_set());
        let service = ModerationService::new(Arc::new(MemoryRepository::new()), Arc::new(card_db.clone()));
        (service, card_db)
    }

    fn proposal(edit: impl FnOnce(&mut ChangeRequest)) -> ChangeRequest {
        let mut request = ChangeRequest::map_card(&fixtures::card());
        request.comment = "Fix the card".to_string();
        edit(&mut request);
        request
    }

    fn set_proposal(edit: impl FnOnce(&mut SetChangeRequest)) -> SetChangeRequest {
        let mut request = SetChangeRequest::map_set(&fixtures::card_set());
        request.comment = "Fix the set".to_string();
        edit(&mut request);
        request
    }

    #[tokio::test]
    async fn test_first_submission_stores_baseline() {
        let (service, _) = service();
        let user = Uuid::new_v4();

        let submitted = service
            .submit_card_change(user, 2, proposal(|r| r.artist = "Ron Spencer".to_string()))
            .await
            .unwrap();
        assert_eq!(submitted.lifecycle.version, 1);
        assert_eq!(submitted.lifecycle.status, ChangeStatus::Pending);
        assert_eq!(submitted.lifecycle.fields_updated, vec![CardField::Artist]);

        let all = service.card_changes(2).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].lifecycle.version, 0);
        assert_eq!(all[0].lifecycle.status, ChangeStatus::Accepted);
        assert_eq!(all[0].comment, BASELINE_COMMENT);
        assert_eq!(all[0].artist, "Mark Poole");
    }

    #[tokio::test]
    async fn test_versions_count_existing_requests() {
        let (service, _) = service();
        let user = Uuid::new_v4();

        service
            .submit_card_change(user, 2, proposal(|r| r.power = 1))
            .await
            .unwrap();
        let second = service
            .submit_card_change(user, 2, proposal(|r| r.toughness = 1))
            .await
            .unwrap();
        assert_eq!(second.lifecycle.version, 2);
    }

    #[tokio::test]
    async fn test_unchanged_proposal_rejected() {
        let (service, _) = service();
        let err = service
            .submit_card_change(Uuid::new_v4(), 2, proposal(|_| {}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(service.card_changes(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_proposal_reports_all_violations() {
        let (service, _) = service();
        let err = service
            .submit_card_change(
                Uuid::new_v4(),
                2,
                proposal(|r| {
                    r.comment.clear();
                    r.power = -1;
                    r.released_at = "93-08-05".to_string();
                }),
            )
            .await
            .unwrap_err();

        match err {
            AppError::InvalidChange(violations) => {
                let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
                assert_eq!(fields, vec!["comment", "power", "releasedAt"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_card_not_found() {
        let (service, _) = service();
        let mut request = proposal(|r| r.name = "Time Walk".to_string());
        request.mvid = 99;
        let err = service
            .submit_card_change(Uuid::new_v4(), 99, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_accept_field_updates_live_record_and_overwrites_siblings() {
        let (service, card_db) = service();
        let user = Uuid::new_v4();

        let first = service
            .submit_card_change(user, 2, proposal(|r| r.artist = "Ron Spencer".to_string()))
            .await
            .unwrap();
        let second = service
            .submit_card_change(user, 2, proposal(|r| r.artist = "Amy Weber".to_string()))
            .await
            .unwrap();
        let unrelated = service
            .submit_card_change(user, 2, proposal(|r| r.loyalty = 3))
            .await
            .unwrap();

        let accepted = service
            .accept_card_field("token-1", second.id, CardField::Artist)
            .await
            .unwrap();
        assert_eq!(accepted.lifecycle.status, ChangeStatus::Accepted);
        assert_eq!(accepted.lifecycle.field_state(CardField::Artist), FieldState::Accepted);

        assert_eq!(
            card_db.updates(),
            vec![(
                "token-1".to_string(),
                "2".to_string(),
                "artist".to_string(),
                Some("Amy Weber".to_string())
            )]
        );

        let first = service.get_card_change(first.id).await.unwrap();
        assert_eq!(first.lifecycle.field_state(CardField::Artist), FieldState::Overwritten);

        let unrelated = service.get_card_change(unrelated.id).await.unwrap();
        assert!(unrelated.lifecycle.changes_overwritten.is_empty());
    }

    #[tokio::test]
    async fn test_accept_rejects_untouched_field_and_closed_request() {
        let (service, card_db) = service();
        let submitted = service
            .submit_card_change(Uuid::new_v4(), 2, proposal(|r| r.rarity = "Uncommon".to_string()))
            .await
            .unwrap();

        let err = service
            .accept_card_field("t", submitted.id, CardField::Name)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        service
            .update_card_change_status(submitted.id, ChangeStatus::Closed)
            .await
            .unwrap();
        let err = service
            .accept_card_field("t", submitted.id, CardField::Rarity)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(card_db.updates().is_empty());
    }

    #[tokio::test]
    async fn test_closed_is_terminal() {
        let (service, _) = service();
        let submitted = service
            .submit_card_change(Uuid::new_v4(), 2, proposal(|r| r.set_number = 5))
            .await
            .unwrap();

        service
            .update_card_change_status(submitted.id, ChangeStatus::Declined)
            .await
            .unwrap();
        service
            .update_card_change_status(submitted.id, ChangeStatus::Closed)
            .await
            .unwrap();
        let err = service
            .update_card_change_status(submitted.id, ChangeStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_review_lists_every_field() {
        let (service, _) = service();
        let submitted = service
            .submit_card_change(Uuid::new_v4(), 2, proposal(|r| r.flavor = Some("Knowledge is power.".to_string())))
            .await
            .unwrap();

        let review = service.review_card_change(submitted.id).await.unwrap();
        assert_eq!(review.fields.len(), CardField::iter().count());

        let flavor = review
            .fields
            .iter()
            .find(|f| f.field == CardField::Flavor)
            .unwrap();
        assert_eq!(flavor.state, FieldState::Changed);
        assert_eq!(flavor.proposed.as_deref(), Some("Knowledge is power."));
        assert_eq!(flavor.current, None);

        let name = review.fields.iter().find(|f| f.field == CardField::Name).unwrap();
        assert_eq!(name.state, FieldState::NoChange);
    }

    #[tokio::test]
    async fn test_status_filter() {
        let (service, _) = service();
        let submitted = service
            .submit_card_change(Uuid::new_v4(), 2, proposal(|r| r.token = true))
            .await
            .unwrap();

        let pending = service.all_card_changes(Some(ChangeStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, submitted.id);

        // baseline plus the proposal
        assert_eq!(service.all_card_changes(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_change_workflow() {
        let (service, card_db) = service();
        let user = Uuid::new_v4();

        let unchanged = set_proposal(|r| {
            r.description = Some("Gods and heroes.\nMonsters too.".to_string());
        });
        let err = service.submit_set_change(user, "THS", unchanged).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let first = service
            .submit_set_change(user, "THS", set_proposal(|r| r.mythic_rare = 16))
            .await
            .unwrap();
        let second = service
            .submit_set_change(user, "THS", set_proposal(|r| r.mythic_rare = 17))
            .await
            .unwrap();
        assert_eq!((first.lifecycle.version, second.lifecycle.version), (1, 2));

        service
            .accept_set_field("token", first.id, SetField::MythicRare)
            .await
            .unwrap();
        assert_eq!(card_db.updates()[0].2, "mythicRare");
        assert_eq!(card_db.updates()[0].3.as_deref(), Some("16"));

        let review = service.review_set_change(second.id).await.unwrap();
        let mythic = review
            .fields
            .iter()
            .find(|f| f.field == SetField::MythicRare)
            .unwrap();
        assert_eq!(mythic.state, FieldState::Overwritten);
        assert_eq!(mythic.current.as_deref(), Some("15"));

        assert_eq!(service.set_changes("THS").await.unwrap().len(), 3);
    }
}
