//! Change request data models
//!
//! A change request carries a full shadow copy of the record it proposes to
//! edit, plus the moderation [`Lifecycle`] tracking which fields were
//! updated, committed or overwritten.

use crate::change::validate::RELEASE_DATE;
use crate::change::{CardField, Lifecycle, SetField};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Proposed revision of one card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    #[serde(flatten)]
    pub lifecycle: Lifecycle<CardField>,
    #[validate(length(min = 1, message = "A comment describing the change is required"))]
    #[serde(default)]
    pub comment: String,

    // Card fields
    /// Multiverse id of the card being changed
    #[serde(default)]
    pub mvid: i32,
    #[validate(range(min = 0, message = "Related card id must be at least 0"))]
    #[serde(default)]
    pub related_card_id: i32,
    #[serde(default)]
    pub set_number: i32,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub flavor: Option<String>,
    #[validate(length(min = 1, message = "At least one color is required"))]
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[validate(range(min = 0, message = "Converted mana cost must be at least 0"))]
    #[serde(default)]
    pub converted_mana_cost: i32,
    #[validate(length(min = 1, message = "Card set name must not be empty"))]
    pub card_set_name: String,
    #[validate(length(min = 1, message = "Type must not be empty"))]
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub token: bool,
    #[validate(range(min = 0, message = "Power must be at least 0"))]
    #[serde(default)]
    pub power: i32,
    #[validate(range(min = 0, message = "Toughness must be at least 0"))]
    #[serde(default)]
    pub toughness: i32,
    #[serde(default)]
    pub loyalty: i32,
    #[validate(length(min = 1, message = "Rarity must not be empty"))]
    pub rarity: String,
    #[validate(length(min = 1, message = "Artist must not be empty"))]
    pub artist: String,
    #[validate(length(min = 1, message = "Card set id must not be empty"))]
    pub card_set_id: String,
    #[validate(nested)]
    #[serde(default)]
    pub rulings: Vec<ChangeRuling>,
    #[validate(nested)]
    #[serde(default)]
    pub formats: Vec<ChangeFormat>,
    #[validate(regex(path = *RELEASE_DATE, message = "Card release date must be in yyyy-mm-dd format"))]
    pub released_at: String,
}

/// Ruling as carried by a change request; the date is a `yyyy-MM-dd` string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRuling {
    #[validate(regex(path = *RELEASE_DATE, message = "Ruling release date must be in yyyy-mm-dd format"))]
    pub released_at: String,
    #[validate(length(min = 1, message = "Ruling text must not be empty"))]
    pub rule: String,
}

/// Format legality as carried by a change request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFormat {
    #[validate(length(min = 1, message = "Format name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Format legality must not be empty"))]
    pub legality: String,
}

/// Proposed revision of one card set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetChangeRequest {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Uuid,
    #[serde(flatten)]
    pub lifecycle: Lifecycle<SetField>,
    #[validate(length(min = 1, message = "A comment describing the change is required"))]
    #[serde(default)]
    pub comment: String,

    // Set fields
    /// Set code of the set being changed
    #[validate(length(min = 1, message = "Set id must not be empty"))]
    #[serde(default)]
    pub set_id: String,
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Type must not be empty"))]
    #[serde(rename = "type")]
    pub set_type: String,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Common count must be at least 0"))]
    #[serde(default)]
    pub common: i32,
    #[validate(range(min = 0, message = "Uncommon count must be at least 0"))]
    #[serde(default)]
    pub uncommon: i32,
    #[validate(range(min = 0, message = "Rare count must be at least 0"))]
    #[serde(default)]
    pub rare: i32,
    #[validate(range(min = 0, message = "Mythic rare count must be at least 0"))]
    #[serde(default)]
    pub mythic_rare: i32,
    #[validate(range(min = 0, message = "Basic land count must be at least 0"))]
    #[serde(default)]
    pub basic_land: i32,
    #[validate(regex(path = *RELEASE_DATE, message = "Set release date must be in yyyy-mm-dd format"))]
    pub released_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carddb::fixtures;
    use crate::change::{check, ChangeStatus};

    #[test]
    fn test_mapped_card_with_comment_is_valid() {
        let mut change = ChangeRequest::map_card(&fixtures::card());
        change.comment = "Fix flavor text".to_string();
        assert!(check(&change).is_ok());
    }

    #[test]
    fn test_validation_reports_every_violation() {
        let mut change = ChangeRequest::map_card(&fixtures::card());
        change.name = String::new();
        change.artist = String::new();
        change.power = -1;
        change.colors.clear();
        change.released_at = "5 Aug 1993".to_string();

        let violations = check(&change).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();

        // comment is empty on a freshly mapped card
        assert_eq!(fields, vec!["artist", "colors", "comment", "name", "power", "releasedAt"]);
        let date = violations.iter().find(|v| v.field == "releasedAt").unwrap();
        assert_eq!(date.code, "regex");
        assert_eq!(date.message, "Card release date must be in yyyy-mm-dd format");
    }

    #[test]
    fn test_validation_reports_nested_rulings_and_formats() {
        let mut change = ChangeRequest::map_card(&fixtures::card());
        change.comment = "Update rulings".to_string();
        change.rulings[1].rule = String::new();
        change.rulings[1].released_at = "yesterday".to_string();
        change.formats[0].legality = String::new();

        let violations = check(&change).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["formats[0].legality", "rulings[1].releasedAt", "rulings[1].rule"]
        );
    }

    #[test]
    fn test_set_change_validation() {
        let mut change = SetChangeRequest::map_set(&fixtures::card_set());
        change.comment = "Counts".to_string();
        assert!(check(&change).is_ok());

        change.rare = -3;
        change.set_id = String::new();
        let violations = check(&change).unwrap_err();
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_submission_json_defaults_bookkeeping() {
        let json = r#"{
            "mvid": 2,
            "name": "Ancestral Recall",
            "cardSetName": "Limited Edition Alpha",
            "type": "Instant",
            "rarity": "Rare",
            "artist": "Mark Poole",
            "cardSetId": "LEA",
            "releasedAt": "1993-08-05",
            "comment": "typo",
            "fieldsUpdated": ["Name"]
        }"#;

        let change: ChangeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(change.id, Uuid::nil());
        assert_eq!(change.lifecycle.version, 0);
        assert_eq!(change.lifecycle.status, ChangeStatus::Pending);
        assert_eq!(change.lifecycle.fields_updated, vec![CardField::Name]);
        assert!(change.rulings.is_empty());
    }

    #[test]
    fn test_lifecycle_is_flattened_in_json() {
        let change = ChangeRequest::map_card(&fixtures::card());
        let value = serde_json::to_value(&change).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["status"], "Pending");
        assert_eq!(value["type"], "Instant");
        assert!(value.get("lifecycle").is_none());
    }
}
