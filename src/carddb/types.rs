//! Live card database records
//!
//! These mirror the JSON returned by the card database API. They are the
//! source of truth that change requests are diffed against.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Live dates arrive as timestamps (`1993-08-05T00:00:00`, optionally with
/// fraction or offset) or as bare `1993-08-05` dates.
pub(crate) mod live_date {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, TIMESTAMP)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_local()))
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid release date '{}'", raw)))
    }
}

/// A card as stored in the live card database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Multiverse id
    pub id: i32,
    #[serde(default)]
    pub related_card_id: i32,
    #[serde(default)]
    pub set_number: i32,
    pub name: String,
    #[serde(default)]
    pub search_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub flavor: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub converted_mana_cost: i32,
    pub card_set_name: String,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub sub_type: Option<String>,
    #[serde(default)]
    pub token: bool,
    #[serde(default)]
    pub power: i32,
    #[serde(default)]
    pub toughness: i32,
    #[serde(default)]
    pub loyalty: i32,
    pub rarity: String,
    pub artist: String,
    pub card_set_id: String,
    #[serde(default)]
    pub rulings: Vec<Ruling>,
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(with = "live_date")]
    pub released_at: NaiveDateTime,
}

/// An official ruling attached to a card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ruling {
    #[serde(with = "live_date")]
    pub released_at: NaiveDateTime,
    pub rule: String,
}

/// Legality of a card in a play format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub name: String,
    pub legality: String,
}

/// A card set as stored in the live card database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    /// Set code, e.g. `THS`
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub set_type: String,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub common: i32,
    #[serde(default)]
    pub uncommon: i32,
    #[serde(default)]
    pub rare: i32,
    #[serde(default)]
    pub mythic_rare: i32,
    #[serde(default)]
    pub basic_land: i32,
    #[serde(with = "live_date")]
    pub released_at: NaiveDateTime,
    #[serde(default)]
    pub card_ids: Vec<i32>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_deserializes_from_api_json() {
        let json = r#"{
            "id": 1,
            "name": "Black Lotus",
            "cardSetName": "Limited Edition Alpha",
            "type": "Artifact",
            "rarity": "Rare",
            "artist": "Christopher Rush",
            "cardSetId": "LEA",
            "releasedAt": "1993-08-05",
            "rulings": [{ "releasedAt": "2004-10-04", "rule": "Mana ability." }]
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.card_type, "Artifact");
        assert!(card.colors.is_empty());
        assert_eq!(card.mana_cost, None);
        assert_eq!(card.rulings[0].released_at, fixtures::date(2004, 10, 4));
    }

    #[test]
    fn test_timestamp_release_dates_are_accepted() {
        let json = r#"{
            "id": 2,
            "name": "Ancestral Recall",
            "cardSetName": "Limited Edition Alpha",
            "type": "Instant",
            "rarity": "Rare",
            "artist": "Mark Poole",
            "cardSetId": "LEA",
            "colors": ["blue"],
            "releasedAt": "1993-08-05T00:00:00",
            "rulings": [
                { "releasedAt": "2004-10-04T00:00:00.000", "rule": "Can target any player." },
                { "releasedAt": "2008-08-01T00:00:00Z", "rule": "Restricted in Vintage." }
            ]
        }"#;

        let card: Card = serde_json::from_str(json).unwrap();
        assert_eq!(card.released_at, fixtures::date(1993, 8, 5));
        assert_eq!(card.rulings[0].released_at, fixtures::date(2004, 10, 4));
        assert_eq!(card.rulings[1].released_at, fixtures::date(2008, 8, 1));

        let change = crate::change::ChangeRequest::map_card(&card);
        assert_eq!(change.released_at, "1993-08-05");
        assert_eq!(change.rulings[0].released_at, "2004-10-04");
        assert!(crate::change::fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_set_timestamp_release_date() {
        let json = r#"{ "id": "THS", "name": "Theros", "type": "Expansion", "releasedAt": "2013-09-27T00:00:00" }"#;
        let set: CardSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.released_at, fixtures::date(2013, 9, 27));
    }

    #[test]
    fn test_garbage_release_date_rejected() {
        let json = r#"{ "releasedAt": "sometime in 1993", "rule": "x" }"#;
        assert!(serde_json::from_str::<Ruling>(json).is_err());
    }

    #[test]
    fn test_release_date_serializes_as_timestamp() {
        let ruling = Ruling {
            released_at: fixtures::date(2004, 10, 4),
            rule: "x".to_string(),
        };
        let json = serde_json::to_value(&ruling).unwrap();
        assert_eq!(json["releasedAt"], "2004-10-04T00:00:00");
    }
}
