//! Field Diff Engine
//!
//! Compares a proposed change against the live record and reports which
//! tracked fields differ.

use crate::carddb::{Card, CardSet};
use crate::change::mapping::format_date;
use crate::change::{CardField, ChangeRequest, SetChangeRequest, SetField};
use std::collections::HashMap;
use std::hash::Hash;
use strum::IntoEnumIterator;

/// Fields of `change` whose values differ from `card`, in [`CardField`] order
pub fn fields_changed(card: &Card, change: &ChangeRequest) -> Vec<CardField> {
    CardField::iter()
        .filter(|field| card_field_differs(card, change, *field))
        .collect()
}

/// Fields of `change` whose values differ from `set`, in [`SetField`] order
pub fn set_fields_changed(set: &CardSet, change: &SetChangeRequest) -> Vec<SetField> {
    SetField::iter()
        .filter(|field| set_field_differs(set, change, *field))
        .collect()
}

fn card_field_differs(card: &Card, change: &ChangeRequest, field: CardField) -> bool {
    match field {
        CardField::Artist => change.artist != card.artist,
        CardField::Colors => multiset_differs(&change.colors, &card.colors),
        CardField::ConvertedManaCost => change.converted_mana_cost != card.converted_mana_cost,
        CardField::RelatedCardId => change.related_card_id != card.related_card_id,
        CardField::Description => text_differs(&change.description, &card.description),
        CardField::Flavor => text_differs(&change.flavor, &card.flavor),
        CardField::Formats => multiset_differs(
            change.formats.iter().map(|f| (f.name.as_str(), f.legality.as_str())),
            card.formats.iter().map(|f| (f.name.as_str(), f.legality.as_str())),
        ),
        CardField::Loyalty => change.loyalty != card.loyalty,
        CardField::ManaCost => optional(&change.mana_cost) != optional(&card.mana_cost),
        CardField::Name => change.name != card.name,
        CardField::Token => change.token != card.token,
        CardField::Power => change.power != card.power,
        CardField::Rarity => change.rarity != card.rarity,
        CardField::ReleasedAt => change.released_at != format_date(card.released_at),
        CardField::Rulings => multiset_differs(
            change
                .rulings
                .iter()
                .map(|r| (r.rule.as_str(), r.released_at.clone())),
            card.rulings
                .iter()
                .map(|r| (r.rule.as_str(), format_date(r.released_at))),
        ),
        CardField::SetNumber => change.set_number != card.set_number,
        CardField::SubType => optional(&change.sub_type) != optional(&card.sub_type),
        CardField::Toughness => change.toughness != card.toughness,
        CardField::Type => change.card_type != card.card_type,
    }
}

fn set_field_differs(set: &CardSet, change: &SetChangeRequest, field: SetField) -> bool {
    match field {
        SetField::Name => change.name != set.name,
        SetField::Type => change.set_type != set.set_type,
        SetField::Block => optional(&change.block) != optional(&set.block),
        SetField::Description => text_differs(&change.description, &set.description),
        SetField::Common => change.common != set.common,
        SetField::Uncommon => change.uncommon != set.uncommon,
        SetField::Rare => change.rare != set.rare,
        SetField::MythicRare => change.mythic_rare != set.mythic_rare,
        SetField::BasicLand => change.basic_land != set.basic_land,
        SetField::ReleasedAt => change.released_at != format_date(set.released_at),
    }
}

/// Absent text compares equal to the empty string
fn optional(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Free text ignores carriage returns, so `\r\n` and `\n` line endings match
fn text_differs(left: &Option<String>, right: &Option<String>) -> bool {
    let strip = |s: &str| s.replace('\r', "");
    strip(optional(left)) != strip(optional(right))
}

/// True unless both sides hold the same elements with the same multiplicities
fn multiset_differs<T, L, R>(left: L, right: R) -> bool
where
    T: Eq + Hash,
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
{
    let mut counts: HashMap<T, i64> = HashMap::new();
    for item in left {
        *counts.entry(item).or_default() += 1;
    }
    for item in right {
        *counts.entry(item).or_default() -= 1;
    }
    counts.values().any(|count| *count != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carddb::fixtures;
    use crate::change::{ChangeFormat, ChangeRuling};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mapped_card_has_no_changes() {
        let card = fixtures::card();
        let change = ChangeRequest::map_card(&card);
        assert_eq!(fields_changed(&card, &change), vec![]);
    }

    #[test]
    fn test_single_field_change_is_reported() {
        let card = fixtures::card();

        let mut change = ChangeRequest::map_card(&card);
        change.description = Some("Target player draws four cards.".to_string());
        assert_eq!(fields_changed(&card, &change), vec![CardField::Description]);

        let mut change = ChangeRequest::map_card(&card);
        change.power = 3;
        assert_eq!(fields_changed(&card, &change), vec![CardField::Power]);

        let mut change = ChangeRequest::map_card(&card);
        change.released_at = "1993-12-01".to_string();
        assert_eq!(fields_changed(&card, &change), vec![CardField::ReleasedAt]);

        let mut change = ChangeRequest::map_card(&card);
        change.token = true;
        assert_eq!(fields_changed(&card, &change), vec![CardField::Token]);
    }

    #[test]
    fn test_several_changes_follow_field_order() {
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.card_type = "Sorcery".to_string();
        change.artist = "Someone Else".to_string();
        change.colors.push("red".to_string());

        assert_eq!(
            fields_changed(&card, &change),
            vec![CardField::Artist, CardField::Colors, CardField::Type]
        );
    }

    #[test]
    fn test_set_membership_is_not_diffed() {
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.card_set_id = "LEB".to_string();
        change.card_set_name = "Limited Edition Beta".to_string();
        assert!(fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_carriage_returns_are_ignored() {
        let mut card = fixtures::card();
        card.flavor = Some("Line one\r\nLine two".to_string());
        let mut change = ChangeRequest::map_card(&card);
        change.flavor = Some("Line one\nLine two".to_string());
        assert!(fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_absent_text_equals_empty_text() {
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.flavor = Some(String::new());
        change.sub_type = Some(String::new());
        assert!(fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_collection_order_is_ignored() {
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.rulings.reverse();
        change.formats.reverse();
        assert!(fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_collection_multiplicity_matters() {
        let mut card = fixtures::card();
        card.colors = vec!["blue".to_string(), "blue".to_string(), "black".to_string()];
        let mut change = ChangeRequest::map_card(&card);
        change.colors = vec!["blue".to_string(), "black".to_string(), "black".to_string()];
        assert_eq!(fields_changed(&card, &change), vec![CardField::Colors]);
    }

    #[test]
    fn test_mismatch_followed_by_match_is_not_a_change() {
        // Same elements, the first proposed format only matches the second live one.
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.formats = vec![
            ChangeFormat {
                name: "Legacy".to_string(),
                legality: "Banned".to_string(),
            },
            ChangeFormat {
                name: "Vintage".to_string(),
                legality: "Restricted".to_string(),
            },
        ];
        assert!(fields_changed(&card, &change).is_empty());
    }

    #[test]
    fn test_ruling_compares_rendered_date() {
        let card = fixtures::card();
        let mut change = ChangeRequest::map_card(&card);
        change.rulings[0] = ChangeRuling {
            released_at: "2004-10-05".to_string(),
            rule: card.rulings[0].rule.clone(),
        };
        assert_eq!(fields_changed(&card, &change), vec![CardField::Rulings]);

        change.rulings.truncate(1);
        assert_eq!(fields_changed(&card, &change), vec![CardField::Rulings]);
    }

    #[test]
    fn test_set_diff() {
        let set = fixtures::card_set();
        let mut change = SetChangeRequest::map_set(&set);
        assert!(set_fields_changed(&set, &change).is_empty());

        change.description = Some("Gods and heroes.\nMonsters too.".to_string());
        assert!(set_fields_changed(&set, &change).is_empty());

        change.mythic_rare = 16;
        change.block = None;
        assert_eq!(
            set_fields_changed(&set, &change),
            vec![SetField::Block, SetField::MythicRare]
        );
    }
}
