use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    Common,
    Uncommon,
    Rare,
    Legendary,
    Mythical,
    Divine,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Legendary => "Legendary",
            Self::Mythical => "Mythical",
            Self::Divine => "Divine",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "common" => Some(Self::Common),
            "uncommon" => Some(Self::Uncommon),
            "rare" => Some(Self::Rare),
            "legendary" => Some(Self::Legendary),
            "mythical" => Some(Self::Mythical),
            "divine" => Some(Self::Divine),
            _ => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Crop,
    Pet,
}

impl ItemSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Pet => "pet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "crop" | "crops" => Some(Self::Crop),
            "pet" | "pets" => Some(Self::Pet),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    GrowthSpeed,
    GoldMultiplier,
    XpMultiplier,
    Special,
}

impl BonusType {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::GrowthSpeed => "speeds up nearby growth",
            Self::GoldMultiplier => "raises the sale value of nearby harvests",
            Self::XpMultiplier => "boosts the experience you earn",
            Self::Special => "adds a passive special effect",
        }
    }
}

/// Immutable catalog entry. `name` is the normalized lookup key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub tier: Tier,
    pub sell_price: u64,
    pub source: ItemSource,
    #[serde(default)]
    pub multi_harvest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_type: Option<BonusType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_value: Option<f64>,
}

impl Item {
    pub fn is_crop(&self) -> bool {
        self.source == ItemSource::Crop
    }

    pub fn is_pet(&self) -> bool {
        self.source == ItemSource::Pet
    }

    /// Whether `text` names this item as a whole word, by display name or key.
    pub fn is_named_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        contains_word(&haystack, &self.display_name.to_lowercase())
            || contains_word(&haystack, &self.name.replace('_', " "))
    }
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Lowercases and joins words with `_`, so "Orange Tulip" and "orange-tulip" share a key.
pub fn normalize_item_key(raw: &str) -> String {
    raw.trim()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::{normalize_item_key, Item, ItemId, ItemSource, Tier};

    fn orange_tulip() -> Item {
        Item {
            id: ItemId(4),
            name: "orange_tulip".to_owned(),
            display_name: "Orange Tulip".to_owned(),
            category: "Flower".to_owned(),
            tier: Tier::Uncommon,
            sell_price: 60,
            source: ItemSource::Crop,
            multi_harvest: false,
            bonus_type: None,
            bonus_value: None,
        }
    }

    #[test]
    fn item_keys_normalize_spacing_case_and_dashes() {
        assert_eq!(normalize_item_key("Orange Tulip"), "orange_tulip");
        assert_eq!(normalize_item_key("  dragon-fruit "), "dragon_fruit");
        assert_eq!(normalize_item_key("CARROT"), "carrot");
        assert_eq!(normalize_item_key("sea__otter"), "sea_otter");
    }

    #[test]
    fn tiers_order_by_rarity() {
        assert!(Tier::Common < Tier::Uncommon);
        assert!(Tier::Legendary < Tier::Divine);
        assert_eq!(Tier::parse("mythical"), Some(Tier::Mythical));
        assert_eq!(Tier::parse("epic"), None);
    }

    #[test]
    fn item_mentions_match_whole_words_only() {
        let item = orange_tulip();

        assert!(item.is_named_in("Plant your Orange Tulip today"));
        assert!(item.is_named_in("orange tulip sells well"));
        assert!(!item.is_named_in("orange tulips are pretty"));
        assert!(!item.is_named_in("an orange sunset"));
    }
}
