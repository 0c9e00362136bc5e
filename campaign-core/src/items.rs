//! Item records.
//!
//! Items are loaded from `items.json` and can be placed in locations as loot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to an item owned by the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

/// Item rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[serde(rename = "Very Rare", alias = "Very_Rare", alias = "VeryRare")]
    VeryRare,
    Legendary,
    Artifact,
}

impl Rarity {
    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::VeryRare => "Very Rare",
            Rarity::Legendary => "Legendary",
            Rarity::Artifact => "Artifact",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An item as stored in `items.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub rarity: Rarity,
    pub description: String,
    #[serde(default)]
    pub attunement: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Item {
    /// "Very Rare (requires attunement)".
    pub fn rarity_line(&self) -> String {
        if self.attunement {
            format!("{} (requires attunement)", self.rarity)
        } else {
            self.rarity.to_string()
        }
    }
}
