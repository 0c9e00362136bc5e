//! NPC stat blocks.
//!
//! A stat block is either a reference to a scanned Monster Manual page or a
//! player-class sheet whose numbers are derived from class, level, ability
//! scores and spell list.

use crate::class_data::{CasterType, CharacterClass, UnarmoredDefense};
use crate::world::{Ability, AbilityScores};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Armor class before any modifiers.
const BASE_AC: i32 = 10;

/// Base armor class under Mage Armor.
const MAGE_ARMOR_AC: i32 = 13;

/// Walking speed in feet for every class.
const DEFAULT_MOVE_SPEED: u32 = 30;

/// The spell that changes the unarmored defense of arcane casters.
pub const MAGE_ARMOR: &str = "Mage Armor";

/// A stat block attached to an NPC.
#[derive(Debug, Clone, PartialEq)]
pub enum StatBlock {
    MonsterManual(MonsterManualReference),
    PlayerClass(PlayerClass),
}

impl StatBlock {
    /// Title shown above the stat block.
    pub fn display_name(&self) -> String {
        match self {
            StatBlock::MonsterManual(reference) => reference.monster_name.clone(),
            StatBlock::PlayerClass(pc) => format!("{}, Level {}", pc.class_name(), pc.level()),
        }
    }

    pub fn as_player_class(&self) -> Option<&PlayerClass> {
        match self {
            StatBlock::PlayerClass(pc) => Some(pc),
            StatBlock::MonsterManual(_) => None,
        }
    }

    pub fn as_player_class_mut(&mut self) -> Option<&mut PlayerClass> {
        match self {
            StatBlock::PlayerClass(pc) => Some(pc),
            StatBlock::MonsterManual(_) => None,
        }
    }
}

/// A scanned Monster Manual page; this system owns no numbers for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonsterManualReference {
    pub monster_name: String,
    pub stat_block_image: PathBuf,
}

impl MonsterManualReference {
    /// Build a reference whose image lives in `pages_dir` as `<monster_name>.png`.
    pub fn new(monster_name: impl Into<String>, pages_dir: impl Into<PathBuf>) -> Self {
        let monster_name = monster_name.into();
        let stat_block_image = pages_dir.into().join(format!("{monster_name}.png"));
        Self {
            monster_name,
            stat_block_image,
        }
    }
}

// ============================================================================
// Spell Slots
// ============================================================================

/// Number of slots available at one spell level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlot {
    pub level: u8,
    pub count: u8,
}

/// Spell slots for a caster type at a character level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpellSlots {
    Defined(Vec<SpellSlot>),
    /// The slot table has no row for this caster type and level.
    Undefined { caster_type: CasterType, level: u8 },
}

impl SpellSlots {
    /// Slots in ascending spell level; empty when undefined.
    pub fn slots(&self) -> &[SpellSlot] {
        match self {
            SpellSlots::Defined(slots) => slots,
            SpellSlots::Undefined { .. } => &[],
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, SpellSlots::Defined(_))
    }

    pub fn count_at(&self, spell_level: u8) -> u8 {
        self.slots()
            .iter()
            .find(|s| s.level == spell_level)
            .map(|s| s.count)
            .unwrap_or(0)
    }
}

/// Proficiency bonus by character level; 2 outside 1..=20.
pub fn proficiency_bonus(level: u8) -> i8 {
    match level {
        1..=4 => 2,
        5..=8 => 3,
        9..=12 => 4,
        13..=16 => 5,
        17..=20 => 6,
        _ => 2,
    }
}

/// Slot table rows as `(spell level, count)`; `None` where the table has no row.
///
/// Rows are only known up to character level 12.
fn slot_row(caster_type: CasterType, level: u8) -> Option<&'static [(u8, u8)]> {
    let row: &'static [(u8, u8)] = match (caster_type, level) {
        (CasterType::None, _) => &[],

        (CasterType::Full, 1) => &[(1, 2)],
        (CasterType::Full, 2) => &[(1, 3)],
        (CasterType::Full, 3) => &[(1, 4), (2, 2)],
        (CasterType::Full, 4) => &[(1, 4), (2, 3)],
        (CasterType::Full, 5) => &[(1, 4), (2, 3), (3, 2)],
        (CasterType::Full, 6) => &[(1, 4), (2, 3), (3, 3)],
        (CasterType::Full, 7) => &[(1, 4), (2, 3), (3, 3), (4, 1)],
        (CasterType::Full, 8) => &[(1, 4), (2, 3), (3, 3), (4, 2)],
        (CasterType::Full, 9) => &[(1, 4), (2, 3), (3, 3), (4, 3), (5, 1)],
        (CasterType::Full, 10) => &[(1, 4), (2, 3), (3, 3), (4, 3), (5, 2)],
        (CasterType::Full, 11 | 12) => &[(1, 4), (2, 3), (3, 3), (4, 3), (5, 2), (6, 1)],

        (CasterType::Half, 1 | 2) => &[(1, 2)],
        (CasterType::Half, 3 | 4) => &[(1, 3)],
        (CasterType::Half, 5 | 6) => &[(1, 4), (2, 2)],
        (CasterType::Half, 7 | 8) => &[(1, 4), (2, 3)],
        (CasterType::Half, 9 | 10) => &[(1, 4), (2, 3), (3, 2)],
        (CasterType::Half, 11 | 12) => &[(1, 4), (2, 3), (3, 3)],

        (CasterType::Third, 3) => &[(1, 2)],
        (CasterType::Third, 4..=6) => &[(1, 3)],
        (CasterType::Third, 7..=9) => &[(1, 4), (2, 2)],
        (CasterType::Third, 10..=12) => &[(1, 4), (2, 3)],

        (CasterType::Pact, 1) => &[(1, 1)],
        (CasterType::Pact, 2) => &[(1, 2)],
        (CasterType::Pact, 3 | 4) => &[(2, 2)],
        (CasterType::Pact, 5 | 6) => &[(3, 2)],
        (CasterType::Pact, 7 | 8) => &[(4, 2)],
        (CasterType::Pact, 9 | 10) => &[(5, 2)],
        (CasterType::Pact, 11 | 12) => &[(5, 3)],

        _ => return None,
    };
    Some(row)
}

/// Look up the slot table. Gaps are reported, never extrapolated.
pub fn spell_slots(caster_type: CasterType, level: u8) -> SpellSlots {
    match slot_row(caster_type, level) {
        Some(row) => SpellSlots::Defined(
            row.iter()
                .map(|&(level, count)| SpellSlot { level, count })
                .collect(),
        ),
        None => SpellSlots::Undefined { caster_type, level },
    }
}

// ============================================================================
// Player Class
// ============================================================================

/// A player-class stat block.
///
/// Every derived number is recomputed from `(class, level, ability scores,
/// spells, armor class override)` whenever one of those inputs changes, so
/// the derived fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerClass {
    class_name: CharacterClass,
    level: u8,
    ability_scores: AbilityScores,
    spells: Vec<String>,
    weapons: Vec<String>,
    armor_class_override: Option<i32>,

    proficiency_bonus: i8,
    hit_points: i32,
    armor_class: i32,
    move_speed: u32,
    caster_type: CasterType,
    spell_save_dc: i32,
    spell_attack_modifier: i32,
    spell_slots: SpellSlots,
}

impl PlayerClass {
    pub fn new(
        class_name: CharacterClass,
        level: u8,
        ability_scores: AbilityScores,
        spells: Vec<String>,
    ) -> Self {
        let mut pc = Self {
            class_name,
            level,
            ability_scores,
            spells,
            weapons: Vec::new(),
            armor_class_override: None,
            proficiency_bonus: 0,
            hit_points: 0,
            armor_class: 0,
            move_speed: DEFAULT_MOVE_SPEED,
            caster_type: CasterType::None,
            spell_save_dc: 0,
            spell_attack_modifier: 0,
            spell_slots: SpellSlots::Defined(Vec::new()),
        };
        pc.derive();
        pc
    }

    /// Use an explicit armor class. Values of 10 or less fall back to the
    /// unarmored default.
    pub fn with_armor_class(mut self, armor_class: Option<i32>) -> Self {
        self.armor_class_override = armor_class;
        self.derive();
        self
    }

    pub fn with_weapons(mut self, weapons: Vec<String>) -> Self {
        self.weapons = weapons;
        self
    }

    /// Recompute every derived field from the inputs.
    ///
    /// Order matters: proficiency feeds the spell DC and attack modifier, the
    /// spell list feeds the default armor class.
    fn derive(&mut self) {
        let data = self.class_name.data();

        self.proficiency_bonus = proficiency_bonus(self.level);

        let con = self.ability_scores.modifier(Ability::Constitution) as i32;
        self.hit_points = self.level as i32 * (data.hit_points_per_level + con);

        self.caster_type = data.caster_type;

        let casting_mod = data
            .spellcasting_ability
            .map(|ability| self.ability_scores.modifier(ability) as i32)
            .unwrap_or(0);
        self.spell_save_dc = 8 + self.proficiency_bonus as i32 + casting_mod;
        self.spell_attack_modifier = self.proficiency_bonus as i32 + casting_mod;

        self.armor_class = match self.armor_class_override {
            Some(ac) if ac > BASE_AC => ac,
            _ => self.default_armor_class(data.unarmored_defense),
        };

        self.spell_slots = spell_slots(self.caster_type, self.level);
    }

    fn default_armor_class(&self, rule: UnarmoredDefense) -> i32 {
        let dex = self.ability_scores.modifier(Ability::Dexterity) as i32;
        match rule {
            UnarmoredDefense::Standard => BASE_AC + dex,
            UnarmoredDefense::WithAbility(ability) => {
                BASE_AC + dex + self.ability_scores.modifier(ability) as i32
            }
            UnarmoredDefense::MageArmor => {
                if self.spells.iter().any(|s| s == MAGE_ARMOR) {
                    MAGE_ARMOR_AC + dex
                } else {
                    BASE_AC + dex
                }
            }
        }
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level;
        self.derive();
    }

    pub fn set_ability_scores(&mut self, ability_scores: AbilityScores) {
        self.ability_scores = ability_scores;
        self.derive();
    }

    pub fn set_spells(&mut self, spells: Vec<String>) {
        self.spells = spells;
        self.derive();
    }

    pub fn set_armor_class_override(&mut self, armor_class: Option<i32>) {
        self.armor_class_override = armor_class;
        self.derive();
    }

    pub fn set_weapons(&mut self, weapons: Vec<String>) {
        self.weapons = weapons;
    }

    pub fn class_name(&self) -> CharacterClass {
        self.class_name
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn ability_scores(&self) -> &AbilityScores {
        &self.ability_scores
    }

    pub fn spells(&self) -> &[String] {
        &self.spells
    }

    pub fn weapons(&self) -> &[String] {
        &self.weapons
    }

    pub fn armor_class_override(&self) -> Option<i32> {
        self.armor_class_override
    }

    pub fn proficiency_bonus(&self) -> i8 {
        self.proficiency_bonus
    }

    pub fn hit_points(&self) -> i32 {
        self.hit_points
    }

    pub fn armor_class(&self) -> i32 {
        self.armor_class
    }

    pub fn move_speed(&self) -> u32 {
        self.move_speed
    }

    pub fn caster_type(&self) -> CasterType {
        self.caster_type
    }

    pub fn spell_save_dc(&self) -> i32 {
        self.spell_save_dc
    }

    pub fn spell_attack_modifier(&self) -> i32 {
        self.spell_attack_modifier
    }

    pub fn spell_slots(&self) -> &SpellSlots {
        &self.spell_slots
    }
}

impl fmt::Display for PlayerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Level {}", self.class_name, self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(str: u8, dex: u8, con: u8, int: u8, wis: u8, cha: u8) -> AbilityScores {
        AbilityScores::new(str, dex, con, int, wis, cha)
    }

    #[test]
    fn test_proficiency_bonus_plateaus() {
        let values: Vec<i8> = (1..=20).map(proficiency_bonus).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));

        let mut distinct = values.clone();
        distinct.dedup();
        assert_eq!(distinct, vec![2, 3, 4, 5, 6]);

        assert_eq!(proficiency_bonus(0), 2);
        assert_eq!(proficiency_bonus(21), 2);
    }

    #[test]
    fn test_hit_points_use_class_and_con() {
        let barbarian = PlayerClass::new(
            CharacterClass::Barbarian,
            3,
            scores(16, 12, 14, 8, 10, 10),
            vec![],
        );
        assert_eq!(barbarian.hit_points(), 3 * (7 + 2));

        let wizard = PlayerClass::new(
            CharacterClass::Wizard,
            4,
            scores(8, 14, 9, 16, 12, 10),
            vec![],
        );
        assert_eq!(wizard.hit_points(), 4 * (4 - 1));
    }

    #[test]
    fn test_unarmored_defense_rules() {
        let barbarian = PlayerClass::new(
            CharacterClass::Barbarian,
            1,
            scores(16, 14, 16, 8, 10, 10),
            vec![],
        );
        assert_eq!(barbarian.armor_class(), 10 + 2 + 3);

        let monk = PlayerClass::new(
            CharacterClass::Monk,
            1,
            scores(10, 16, 10, 10, 14, 10),
            vec![],
        );
        assert_eq!(monk.armor_class(), 10 + 3 + 2);

        let fighter = PlayerClass::new(
            CharacterClass::Fighter,
            1,
            scores(16, 12, 16, 8, 10, 10),
            vec![],
        );
        assert_eq!(fighter.armor_class(), 11);
    }

    #[test]
    fn test_mage_armor_changes_default_ac() {
        let dex14 = scores(8, 14, 12, 16, 10, 10);
        let plain = PlayerClass::new(CharacterClass::Wizard, 1, dex14, vec!["Fire Bolt".into()]);
        assert_eq!(plain.armor_class(), 12);

        let mut armored = plain.clone();
        armored.set_spells(vec!["Fire Bolt".into(), MAGE_ARMOR.into()]);
        assert_eq!(armored.armor_class(), 15);

        // Mage Armor does nothing for a class without the rule
        let cleric = PlayerClass::new(CharacterClass::Cleric, 1, dex14, vec![MAGE_ARMOR.into()]);
        assert_eq!(cleric.armor_class(), 12);
    }

    #[test]
    fn test_explicit_armor_class_overrides_default() {
        let fighter = PlayerClass::new(CharacterClass::Fighter, 1, AbilityScores::default(), vec![])
            .with_armor_class(Some(18));
        assert_eq!(fighter.armor_class(), 18);

        let low = PlayerClass::new(CharacterClass::Fighter, 1, AbilityScores::default(), vec![])
            .with_armor_class(Some(9));
        assert_eq!(low.armor_class(), 10);
    }

    #[test]
    fn test_spell_save_dc_and_attack() {
        let cleric = PlayerClass::new(
            CharacterClass::Cleric,
            5,
            scores(10, 10, 10, 10, 16, 10),
            vec![],
        );
        assert_eq!(cleric.proficiency_bonus(), 3);
        assert_eq!(cleric.spell_save_dc(), 8 + 3 + 3);
        assert_eq!(cleric.spell_attack_modifier(), 3 + 3);

        let fighter = PlayerClass::new(
            CharacterClass::Fighter,
            5,
            scores(10, 10, 10, 10, 16, 18),
            vec![],
        );
        assert_eq!(fighter.spell_save_dc(), 8 + 3);
        assert_eq!(fighter.spell_attack_modifier(), 3);
    }

    #[test]
    fn test_spell_slot_table() {
        assert_eq!(
            spell_slots(CasterType::Full, 5).slots(),
            &[
                SpellSlot { level: 1, count: 4 },
                SpellSlot { level: 2, count: 3 },
                SpellSlot { level: 3, count: 2 },
            ]
        );
        assert_eq!(spell_slots(CasterType::Half, 2).count_at(1), 2);
        assert_eq!(spell_slots(CasterType::Pact, 11).slots(), &[SpellSlot { level: 5, count: 3 }]);
        assert_eq!(spell_slots(CasterType::Third, 7).count_at(2), 2);
        assert_eq!(spell_slots(CasterType::None, 15), SpellSlots::Defined(vec![]));
    }

    #[test]
    fn test_spell_slot_gaps_are_undefined() {
        for caster_type in [CasterType::Full, CasterType::Half, CasterType::Third, CasterType::Pact] {
            for level in 13..=20 {
                let slots = spell_slots(caster_type, level);
                assert_eq!(slots, SpellSlots::Undefined { caster_type, level });
                assert!(slots.slots().is_empty());
            }
        }
        assert!(!spell_slots(CasterType::Third, 1).is_defined());
        assert!(!spell_slots(CasterType::Third, 2).is_defined());
        assert!(!spell_slots(CasterType::Full, 0).is_defined());
    }

    #[test]
    fn test_identical_inputs_give_equal_stat_blocks() {
        let inputs = || {
            (
                CharacterClass::Sorcerer,
                7,
                scores(8, 14, 14, 10, 10, 18),
                vec![MAGE_ARMOR.to_string(), "Fireball".to_string()],
            )
        };
        let (c, l, s, sp) = inputs();
        let a = PlayerClass::new(c, l, s, sp);
        let (c, l, s, sp) = inputs();
        let b = PlayerClass::new(c, l, s, sp);
        assert_eq!(a, b);
        assert_eq!(a.caster_type(), CasterType::Full);
        assert_eq!(a.spell_save_dc(), 8 + 3 + 4);
    }

    #[test]
    fn test_setters_rederive_everything() {
        let mut pc = PlayerClass::new(CharacterClass::Paladin, 4, AbilityScores::default(), vec![]);
        pc.set_level(9);
        pc.set_ability_scores(scores(16, 10, 14, 8, 10, 16));

        let fresh = PlayerClass::new(
            CharacterClass::Paladin,
            9,
            scores(16, 10, 14, 8, 10, 16),
            vec![],
        );
        assert_eq!(pc, fresh);
        assert_eq!(pc.proficiency_bonus(), 4);
        assert_eq!(pc.spell_slots().count_at(3), 2);
        assert_eq!(pc.hit_points(), 9 * (6 + 2));
    }

    #[test]
    fn test_armor_override_and_weapons_setters() {
        let dex14 = scores(10, 14, 10, 10, 10, 10);
        let mut fighter = PlayerClass::new(CharacterClass::Fighter, 3, dex14, vec![]);
        assert_eq!(fighter.armor_class(), 12);

        fighter.set_armor_class_override(Some(18));
        assert_eq!(fighter.armor_class_override(), Some(18));
        assert_eq!(fighter.armor_class(), 18);

        // Ten or lower falls back to the computed default
        fighter.set_armor_class_override(Some(10));
        assert_eq!(fighter.armor_class(), 12);
        fighter.set_armor_class_override(None);
        assert_eq!(fighter.armor_class(), 12);

        fighter.set_weapons(vec!["Longsword".into(), "Shortbow".into()]);
        assert_eq!(fighter.weapons(), ["Longsword", "Shortbow"]);
        assert_eq!(fighter.hit_points(), 3 * 6);
        assert_eq!(fighter.armor_class(), 12);
    }

    #[test]
    fn test_display_names() {
        let pc = PlayerClass::new(CharacterClass::Rogue, 3, AbilityScores::default(), vec![]);
        assert_eq!(StatBlock::PlayerClass(pc).display_name(), "Rogue, Level 3");

        let reference = MonsterManualReference::new("goblin", "Media/MonsterManual");
        assert_eq!(
            reference.stat_block_image,
            PathBuf::from("Media/MonsterManual/goblin.png")
        );
        assert_eq!(StatBlock::MonsterManual(reference).display_name(), "goblin");
    }
}
