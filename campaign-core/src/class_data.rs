//! D&D 5e class data for player-class stat blocks.
//!
//! Contains the per-class numbers the stat block derivation needs: hit points
//! gained per level, caster progression, spellcasting ability and the
//! unarmored defense rule, for all 12 PHB classes.

use crate::world::Ability;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// D&D character classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Barbarian,
    Bard,
    Cleric,
    Druid,
    Fighter,
    Monk,
    Paladin,
    Ranger,
    Rogue,
    Sorcerer,
    Warlock,
    Wizard,
}

/// How many spell slots a class accrues per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CasterType {
    Full,
    Half,
    Third,
    Pact,
    None,
}

impl CasterType {
    pub fn name(&self) -> &'static str {
        match self {
            CasterType::Full => "Full",
            CasterType::Half => "Half",
            CasterType::Third => "Third",
            CasterType::Pact => "Pact",
            CasterType::None => "None",
        }
    }
}

impl fmt::Display for CasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Armor class formula used when a character wears no armor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnarmoredDefense {
    /// 10 + DEX modifier.
    Standard,
    /// 10 + DEX modifier + another ability's modifier (Barbarian, Monk).
    WithAbility(Ability),
    /// 13 + DEX modifier with Mage Armor known, otherwise 10 + DEX modifier.
    MageArmor,
}

/// Class-specific numbers for stat block derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassData {
    /// Hit points gained per level, before the CON modifier.
    pub hit_points_per_level: i32,
    /// Spell slot progression.
    pub caster_type: CasterType,
    /// Ability used for spell save DC and spell attacks.
    pub spellcasting_ability: Option<Ability>,
    /// Armor class rule without armor.
    pub unarmored_defense: UnarmoredDefense,
}

impl CharacterClass {
    /// Get the stat block table for this class.
    pub fn data(&self) -> ClassData {
        match self {
            CharacterClass::Barbarian => ClassData {
                hit_points_per_level: 7,
                caster_type: CasterType::None,
                spellcasting_ability: None,
                unarmored_defense: UnarmoredDefense::WithAbility(Ability::Constitution),
            },
            CharacterClass::Bard => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::Full,
                spellcasting_ability: Some(Ability::Charisma),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Cleric => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::Full,
                spellcasting_ability: Some(Ability::Wisdom),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Druid => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::Full,
                spellcasting_ability: Some(Ability::Wisdom),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Fighter => ClassData {
                hit_points_per_level: 6,
                caster_type: CasterType::None,
                spellcasting_ability: None,
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Monk => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::None,
                spellcasting_ability: None,
                unarmored_defense: UnarmoredDefense::WithAbility(Ability::Wisdom),
            },
            CharacterClass::Paladin => ClassData {
                hit_points_per_level: 6,
                caster_type: CasterType::Half,
                spellcasting_ability: Some(Ability::Charisma),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Ranger => ClassData {
                hit_points_per_level: 6,
                caster_type: CasterType::Half,
                spellcasting_ability: Some(Ability::Wisdom),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            // Arcane Trickster would make this a Third caster; subclasses are not modelled.
            CharacterClass::Rogue => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::None,
                spellcasting_ability: None,
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Sorcerer => ClassData {
                hit_points_per_level: 4,
                caster_type: CasterType::Full,
                spellcasting_ability: Some(Ability::Charisma),
                unarmored_defense: UnarmoredDefense::MageArmor,
            },
            CharacterClass::Warlock => ClassData {
                hit_points_per_level: 5,
                caster_type: CasterType::Pact,
                spellcasting_ability: Some(Ability::Charisma),
                unarmored_defense: UnarmoredDefense::Standard,
            },
            CharacterClass::Wizard => ClassData {
                hit_points_per_level: 4,
                caster_type: CasterType::Full,
                spellcasting_ability: Some(Ability::Intelligence),
                unarmored_defense: UnarmoredDefense::MageArmor,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Barbarian => "Barbarian",
            CharacterClass::Bard => "Bard",
            CharacterClass::Cleric => "Cleric",
            CharacterClass::Druid => "Druid",
            CharacterClass::Fighter => "Fighter",
            CharacterClass::Monk => "Monk",
            CharacterClass::Paladin => "Paladin",
            CharacterClass::Ranger => "Ranger",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Sorcerer => "Sorcerer",
            CharacterClass::Warlock => "Warlock",
            CharacterClass::Wizard => "Wizard",
        }
    }

    pub fn caster_type(&self) -> CasterType {
        self.data().caster_type
    }

    /// Get all character classes.
    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Barbarian,
            CharacterClass::Bard,
            CharacterClass::Cleric,
            CharacterClass::Druid,
            CharacterClass::Fighter,
            CharacterClass::Monk,
            CharacterClass::Paladin,
            CharacterClass::Ranger,
            CharacterClass::Rogue,
            CharacterClass::Sorcerer,
            CharacterClass::Warlock,
            CharacterClass::Wizard,
        ]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a class name is not one of the 12 classes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown character class: {0}")]
pub struct UnknownClass(pub String);

impl FromStr for CharacterClass {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        CharacterClass::all()
            .iter()
            .find(|c| c.name() == trimmed)
            .or_else(|| {
                CharacterClass::all()
                    .iter()
                    .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            })
            .copied()
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_classes_have_data() {
        for class in CharacterClass::all() {
            let data = class.data();
            assert!(data.hit_points_per_level >= 4);
            assert!(data.hit_points_per_level <= 7);
        }
        assert_eq!(CharacterClass::all().len(), 12);
    }

    #[test]
    fn test_caster_types() {
        for class in [
            CharacterClass::Bard,
            CharacterClass::Cleric,
            CharacterClass::Druid,
            CharacterClass::Sorcerer,
            CharacterClass::Wizard,
        ] {
            assert_eq!(class.caster_type(), CasterType::Full, "{class}");
        }
        assert_eq!(CharacterClass::Paladin.caster_type(), CasterType::Half);
        assert_eq!(CharacterClass::Ranger.caster_type(), CasterType::Half);
        assert_eq!(CharacterClass::Warlock.caster_type(), CasterType::Pact);
        for class in [
            CharacterClass::Barbarian,
            CharacterClass::Fighter,
            CharacterClass::Monk,
            CharacterClass::Rogue,
        ] {
            assert_eq!(class.caster_type(), CasterType::None, "{class}");
        }
    }

    #[test]
    fn test_spellcasting_abilities() {
        assert_eq!(
            CharacterClass::Ranger.data().spellcasting_ability,
            Some(Ability::Wisdom)
        );
        assert_eq!(
            CharacterClass::Paladin.data().spellcasting_ability,
            Some(Ability::Charisma)
        );
        assert_eq!(
            CharacterClass::Wizard.data().spellcasting_ability,
            Some(Ability::Intelligence)
        );
        assert_eq!(CharacterClass::Fighter.data().spellcasting_ability, None);
    }

    #[test]
    fn test_parse_class_name() {
        assert_eq!("Wizard".parse::<CharacterClass>(), Ok(CharacterClass::Wizard));
        assert_eq!("rogue".parse::<CharacterClass>(), Ok(CharacterClass::Rogue));
        assert!("Artificer".parse::<CharacterClass>().is_err());
    }
}
