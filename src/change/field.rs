//! Tracked field identifiers and per-field review state

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Card attributes that a change request can propose edits for.
///
/// Declaration order is the order fields are reported by the diff.
/// Parsing is ASCII case-insensitive, so `ManaCost` and `manacost`
/// both resolve to [`CardField::ManaCost`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display, EnumIter,
)]
#[serde(try_from = "String", into = "String")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum CardField {
    Artist,
    Colors,
    ConvertedManaCost,
    RelatedCardId,
    Description,
    Flavor,
    Formats,
    Loyalty,
    ManaCost,
    Name,
    Token,
    Power,
    Rarity,
    ReleasedAt,
    Rulings,
    SetNumber,
    SubType,
    Toughness,
    Type,
}

/// Card set attributes that a set change request can propose edits for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr, Display, EnumIter,
)]
#[serde(try_from = "String", into = "String")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum SetField {
    Name,
    Type,
    Block,
    Description,
    Common,
    Uncommon,
    Rare,
    MythicRare,
    BasicLand,
    ReleasedAt,
}

macro_rules! string_conversions {
    ($field:ty, $label:literal) => {
        impl TryFrom<String> for $field {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value
                    .parse()
                    .map_err(|_| format!("unknown {} field '{}'", $label, value))
            }
        }

        impl From<$field> for String {
            fn from(field: $field) -> Self {
                field.as_ref().to_string()
            }
        }
    };
}

string_conversions!(CardField, "card");
string_conversions!(SetField, "set");

/// Review state of a single field within a change request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    /// Resubmission that does not touch this field
    #[serde(rename = "nochange")]
    NoChange,
    /// The whole request was closed
    #[serde(rename = "closed")]
    Closed,
    /// A later accepted change replaced this proposal
    #[serde(rename = "overwritten")]
    Overwritten,
    /// The proposed value was applied to the live record
    #[serde(rename = "accepted")]
    Accepted,
    /// Proposed and still awaiting a decision
    #[serde(rename = "changed")]
    Changed,
    /// Nothing to report, e.g. the version 0 snapshot
    #[serde(rename = "")]
    Unresolved,
}

impl FieldState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldState::NoChange => "nochange",
            FieldState::Closed => "closed",
            FieldState::Overwritten => "overwritten",
            FieldState::Accepted => "accepted",
            FieldState::Changed => "changed",
            FieldState::Unresolved => "",
        }
    }
}

impl std::fmt::Display for FieldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_card_field_names_are_camel_case() {
        assert_eq!(CardField::ConvertedManaCost.as_ref(), "convertedManaCost");
        assert_eq!(CardField::Type.to_string(), "type");
        assert_eq!(SetField::MythicRare.as_ref(), "mythicRare");
    }

    #[test]
    fn test_field_parsing_ignores_case() {
        assert_eq!("ManaCost".parse::<CardField>().unwrap(), CardField::ManaCost);
        assert_eq!("RELEASEDAT".parse::<CardField>().unwrap(), CardField::ReleasedAt);
        assert_eq!("basicland".parse::<SetField>().unwrap(), SetField::BasicLand);
        assert!("cardSetId".parse::<CardField>().is_err());
    }

    #[test]
    fn test_field_serde_uses_names() {
        let json = serde_json::to_string(&vec![CardField::SubType, CardField::Rulings]).unwrap();
        assert_eq!(json, r#"["subType","rulings"]"#);

        let fields: Vec<CardField> = serde_json::from_str(r#"["Description","flavor"]"#).unwrap();
        assert_eq!(fields, vec![CardField::Description, CardField::Flavor]);

        assert!(serde_json::from_str::<Vec<CardField>>(r#"["bogus"]"#).is_err());
    }

    #[test]
    fn test_field_order_starts_with_artist() {
        assert_eq!(CardField::iter().next(), Some(CardField::Artist));
        assert_eq!(CardField::iter().count(), 19);
        assert_eq!(SetField::iter().count(), 10);
    }

    #[test]
    fn test_field_state_serializes_to_legacy_strings() {
        assert_eq!(serde_json::to_string(&FieldState::NoChange).unwrap(), r#""nochange""#);
        assert_eq!(serde_json::to_string(&FieldState::Unresolved).unwrap(), r#""""#);
        assert_eq!(FieldState::Overwritten.to_string(), "overwritten");
    }
}
