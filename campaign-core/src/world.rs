//! Campaign world types.
//!
//! Contains the value types every collection is built from: ability scores,
//! races, alignments, NPCs, class actions and conditions.

use crate::stat_block::StatBlock;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Modifier for a raw ability score.
///
/// Floor division toward negative infinity: 8-9 = -1, 10-11 = 0, 12-13 = +1.
pub fn modifier(score: u8) -> i8 {
    (score as i16 - 10).div_euclid(2) as i8
}

/// Ability scores container.
///
/// Accepts both `strength` and `Strength` keys on input; missing scores are 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbilityScores {
    #[serde(alias = "Strength")]
    pub strength: u8,
    #[serde(alias = "Dexterity")]
    pub dexterity: u8,
    #[serde(alias = "Constitution")]
    pub constitution: u8,
    #[serde(alias = "Intelligence")]
    pub intelligence: u8,
    #[serde(alias = "Wisdom")]
    pub wisdom: u8,
    #[serde(alias = "Charisma")]
    pub charisma: u8,
}

impl AbilityScores {
    pub fn new(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    pub fn modifier(&self, ability: Ability) -> i8 {
        modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Races and Alignments
// ============================================================================

/// Playable and common NPC races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Race {
    Human,
    Elf,
    HalfElf,
    Dwarf,
    Halfling,
    Gnome,
    HalfOrc,
    Orc,
    Tiefling,
    Dragonborn,
    Aasimar,
    Goblin,
    Hobgoblin,
    Kobold,
    Tabaxi,
    Goliath,
    Firbolg,
    Genasi,
}

/// (variant, display label, member name) for every race.
const RACES: &[(Race, &str, &str)] = &[
    (Race::Human, "Human", "Human"),
    (Race::Elf, "Elf", "Elf"),
    (Race::HalfElf, "Half-Elf", "Half_Elf"),
    (Race::Dwarf, "Dwarf", "Dwarf"),
    (Race::Halfling, "Halfling", "Halfling"),
    (Race::Gnome, "Gnome", "Gnome"),
    (Race::HalfOrc, "Half-Orc", "Half_Orc"),
    (Race::Orc, "Orc", "Orc"),
    (Race::Tiefling, "Tiefling", "Tiefling"),
    (Race::Dragonborn, "Dragonborn", "Dragonborn"),
    (Race::Aasimar, "Aasimar", "Aasimar"),
    (Race::Goblin, "Goblin", "Goblin"),
    (Race::Hobgoblin, "Hobgoblin", "Hobgoblin"),
    (Race::Kobold, "Kobold", "Kobold"),
    (Race::Tabaxi, "Tabaxi", "Tabaxi"),
    (Race::Goliath, "Goliath", "Goliath"),
    (Race::Firbolg, "Firbolg", "Firbolg"),
    (Race::Genasi, "Genasi", "Genasi"),
];

/// Character alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    LawfulGood,
    NeutralGood,
    ChaoticGood,
    LawfulNeutral,
    TrueNeutral,
    ChaoticNeutral,
    LawfulEvil,
    NeutralEvil,
    ChaoticEvil,
    Unaligned,
}

const ALIGNMENTS: &[(Alignment, &str, &str)] = &[
    (Alignment::LawfulGood, "Lawful Good", "Lawful_Good"),
    (Alignment::NeutralGood, "Neutral Good", "Neutral_Good"),
    (Alignment::ChaoticGood, "Chaotic Good", "Chaotic_Good"),
    (Alignment::LawfulNeutral, "Lawful Neutral", "Lawful_Neutral"),
    (Alignment::TrueNeutral, "True Neutral", "True_Neutral"),
    (Alignment::ChaoticNeutral, "Chaotic Neutral", "Chaotic_Neutral"),
    (Alignment::LawfulEvil, "Lawful Evil", "Lawful_Evil"),
    (Alignment::NeutralEvil, "Neutral Evil", "Neutral_Evil"),
    (Alignment::ChaoticEvil, "Chaotic Evil", "Chaotic_Evil"),
    (Alignment::Unaligned, "Unaligned", "Unaligned"),
];

lazy_static! {
    static ref RACE_BY_LABEL: HashMap<&'static str, Race> =
        RACES.iter().map(|(r, label, _)| (*label, *r)).collect();
    static ref RACE_BY_MEMBER: HashMap<&'static str, Race> =
        RACES.iter().map(|(r, _, member)| (*member, *r)).collect();
    static ref ALIGNMENT_BY_LABEL: HashMap<&'static str, Alignment> =
        ALIGNMENTS.iter().map(|(a, label, _)| (*label, *a)).collect();
    static ref ALIGNMENT_BY_MEMBER: HashMap<&'static str, Alignment> =
        ALIGNMENTS.iter().map(|(a, _, member)| (*member, *a)).collect();
}

impl Race {
    /// Parse a stored race: display label first, then the member name.
    pub fn parse(value: &str) -> Option<Race> {
        RACE_BY_LABEL
            .get(value)
            .or_else(|| RACE_BY_MEMBER.get(value))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        RACES
            .iter()
            .find(|(r, _, _)| r == self)
            .map(|(_, label, _)| *label)
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Alignment {
    /// Parse a stored alignment: display label first, then the member name.
    pub fn parse(value: &str) -> Option<Alignment> {
        ALIGNMENT_BY_LABEL
            .get(value)
            .or_else(|| ALIGNMENT_BY_MEMBER.get(value))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        ALIGNMENTS
            .iter()
            .find(|(a, _, _)| a == self)
            .map(|(_, label, _)| *label)
            .unwrap_or("Unaligned")
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// NPCs
// ============================================================================

/// Handle to an NPC owned by the repository.
///
/// Stable for the lifetime of a loaded repository, including across renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NpcId(pub usize);

impl fmt::Display for NpcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "npc#{}", self.0)
    }
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq)]
pub struct Npc {
    pub name: String,
    pub race: Race,
    pub sex: String,
    pub age: String,
    pub alignment: Alignment,
    pub stat_block: Option<StatBlock>,
    pub appearance: String,
    pub backstory: String,
    pub additional_traits: Vec<String>,
    pub campaign_notes: String,
    pub alive: bool,
    pub aliases: Vec<String>,
}

/// Short listing form of an NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NpcSummary {
    pub name: String,
    pub race: String,
    pub alignment: String,
    pub appearance: String,
}

/// Length of the appearance excerpt in [`NpcSummary`].
const SUMMARY_APPEARANCE_CHARS: usize = 140;

impl Npc {
    pub fn new(name: impl Into<String>, race: Race, alignment: Alignment) -> Self {
        Self {
            name: name.into(),
            race,
            sex: String::new(),
            age: String::new(),
            alignment,
            stat_block: None,
            appearance: String::new(),
            backstory: String::new(),
            additional_traits: Vec::new(),
            campaign_notes: String::new(),
            alive: true,
            aliases: Vec::new(),
        }
    }

    pub fn with_stat_block(mut self, stat_block: StatBlock) -> Self {
        self.stat_block = Some(stat_block);
        self
    }

    pub fn with_appearance(mut self, appearance: impl Into<String>) -> Self {
        self.appearance = appearance.into();
        self
    }

    pub fn with_backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    /// Hover text: the appearance, or the backstory when there is none.
    pub fn hover_text(&self, max_chars: usize) -> String {
        let appearance = self.appearance.trim();
        let text = if appearance.is_empty() {
            self.backstory.trim()
        } else {
            appearance
        };
        truncate_chars(text, max_chars)
    }

    pub fn summary(&self) -> NpcSummary {
        let appearance = if self.appearance.chars().count() > SUMMARY_APPEARANCE_CHARS {
            let excerpt: String = self.appearance.chars().take(SUMMARY_APPEARANCE_CHARS).collect();
            format!("{excerpt}...")
        } else {
            self.appearance.clone()
        };
        NpcSummary {
            name: self.name.clone(),
            race: self.race.label().to_string(),
            alignment: self.alignment.label().to_string(),
            appearance,
        }
    }
}

// ============================================================================
// Class Actions and Conditions
// ============================================================================

/// A class feature or action (e.g. "Second Wind", "Sneak Attack").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAction {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// A status condition (e.g. "Prone", "Frightened").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Unicode-safe truncation; trailing whitespace is dropped before the ellipsis.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{}…", truncated.trim_end())
}
