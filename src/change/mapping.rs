//! Mapping live records into change requests, and rendering field values

use crate::carddb::{Card, CardSet};
use crate::change::{
    CardField, ChangeFormat, ChangeRequest, ChangeRuling, Lifecycle, SetChangeRequest, SetField,
};
use crate::error::AppError;
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Fixed date rendering used by change requests
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Live dates carry a time of day; change requests compare the date only
pub fn format_date(at: NaiveDateTime) -> String {
    at.format(DATE_FORMAT).to_string()
}

impl ChangeRequest {
    /// Copy every attribute of a live card into a fresh version 0 request
    pub fn map_card(card: &Card) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            lifecycle: Lifecycle::default(),
            comment: String::new(),
            mvid: card.id,
            related_card_id: card.related_card_id,
            set_number: card.set_number,
            name: card.name.clone(),
            description: card.description.clone(),
            flavor: card.flavor.clone(),
            colors: card.colors.clone(),
            mana_cost: card.mana_cost.clone(),
            converted_mana_cost: card.converted_mana_cost,
            card_set_name: card.card_set_name.clone(),
            card_type: card.card_type.clone(),
            sub_type: card.sub_type.clone(),
            token: card.token,
            power: card.power,
            toughness: card.toughness,
            loyalty: card.loyalty,
            rarity: card.rarity.clone(),
            artist: card.artist.clone(),
            card_set_id: card.card_set_id.clone(),
            rulings: card
                .rulings
                .iter()
                .map(|r| ChangeRuling {
                    released_at: format_date(r.released_at),
                    rule: r.rule.clone(),
                })
                .collect(),
            formats: card
                .formats
                .iter()
                .map(|f| ChangeFormat {
                    name: f.name.clone(),
                    legality: f.legality.clone(),
                })
                .collect(),
            released_at: format_date(card.released_at),
        }
    }

    /// The proposed value of `field` as sent to the card database's update
    /// command. `None` when an optional text field is absent.
    pub fn field_value(&self, field: CardField) -> Result<Option<String>, AppError> {
        let value = match field {
            CardField::Artist => self.artist.clone(),
            CardField::Colors => self.colors.join(","),
            CardField::ConvertedManaCost => self.converted_mana_cost.to_string(),
            CardField::RelatedCardId => self.related_card_id.to_string(),
            CardField::Description => return Ok(self.description.clone()),
            CardField::Flavor => return Ok(self.flavor.clone()),
            CardField::Formats => to_json(&self.formats)?,
            CardField::Loyalty => self.loyalty.to_string(),
            CardField::ManaCost => return Ok(self.mana_cost.clone()),
            CardField::Name => self.name.clone(),
            CardField::Token => self.token.to_string(),
            CardField::Power => self.power.to_string(),
            CardField::Rarity => self.rarity.clone(),
            CardField::ReleasedAt => self.released_at.clone(),
            CardField::Rulings => to_json(&self.rulings)?,
            CardField::SetNumber => self.set_number.to_string(),
            CardField::SubType => return Ok(self.sub_type.clone()),
            CardField::Toughness => self.toughness.to_string(),
            CardField::Type => self.card_type.clone(),
        };
        Ok(Some(value))
    }
}

impl SetChangeRequest {
    /// Copy every attribute of a live card set into a fresh version 0 request
    pub fn map_set(set: &CardSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            lifecycle: Lifecycle::default(),
            comment: String::new(),
            set_id: set.id.clone(),
            name: set.name.clone(),
            set_type: set.set_type.clone(),
            block: set.block.clone(),
            description: set.description.clone(),
            common: set.common,
            uncommon: set.uncommon,
            rare: set.rare,
            mythic_rare: set.mythic_rare,
            basic_land: set.basic_land,
            released_at: format_date(set.released_at),
        }
    }

    pub fn field_value(&self, field: SetField) -> Option<String> {
        let value = match field {
            SetField::Name => self.name.clone(),
            SetField::Type => self.set_type.clone(),
            SetField::Block => return self.block.clone(),
            SetField::Description => return self.description.clone(),
            SetField::Common => self.common.to_string(),
            SetField::Uncommon => self.uncommon.to_string(),
            SetField::Rare => self.rare.to_string(),
            SetField::MythicRare => self.mythic_rare.to_string(),
            SetField::BasicLand => self.basic_land.to_string(),
            SetField::ReleasedAt => self.released_at.clone(),
        };
        Some(value)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| AppError::Internal(format!("Failed to render field value: {}", e)))
}
