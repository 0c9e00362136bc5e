//! On-disk record shapes for NPCs and locations.
//!
//! These mirror `npcs.json` and `locations.json` exactly: everything is keyed
//! by name and enums are stored as their display labels. The repository turns
//! them into [`Npc`] values and [`LocationTree`](crate::location::LocationTree)
//! nodes, and turns them back when saving.

use crate::class_data::CharacterClass;
use crate::config::MediaLayout;
use crate::stat_block::{MonsterManualReference, PlayerClass, StatBlock};
use crate::world::{AbilityScores, Alignment, Npc, Race};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// Skip reasons
// ============================================================================

/// Why a record was left out of the loaded campaign.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("unknown race '{0}'")]
    UnknownRace(String),

    #[error("unknown alignment '{0}'")]
    UnknownAlignment(String),

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("invalid stat block: {0}")]
    InvalidStatBlock(String),

    #[error("duplicate name")]
    DuplicateName,

    #[error("parent '{0}' would create a cycle")]
    ParentCycle(String),
}

// ============================================================================
// Stat Blocks
// ============================================================================

/// A stat block as written in `npcs.json`, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StatBlockRecord {
    #[serde(rename = "monstermanual")]
    MonsterManual { monster_name: String },

    #[serde(rename = "pc_class")]
    PlayerClass {
        #[serde(default = "default_class")]
        class: String,
        #[serde(default = "default_level", deserialize_with = "level_from_any")]
        level: u8,
        #[serde(default)]
        ability_scores: AbilityScores,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        armor_class: Option<i32>,
        #[serde(default)]
        spells: Vec<String>,
        #[serde(default)]
        weapons: Vec<String>,
    },
}

fn default_class() -> String {
    CharacterClass::Wizard.name().to_string()
}

fn default_level() -> u8 {
    1
}

/// Levels show up as `3` or `"3"` in hand-edited files.
fn level_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Level {
        Number(u64),
        Text(String),
    }

    match Level::deserialize(deserializer)? {
        Level::Number(n) => u8::try_from(n).map_err(serde::de::Error::custom),
        Level::Text(s) => s.trim().parse::<u8>().map_err(serde::de::Error::custom),
    }
}

impl StatBlockRecord {
    /// Decode the raw `stat_block` value of an NPC record.
    ///
    /// `Ok(None)` covers a missing or null block and any unrecognized `type`.
    /// A recognized type with a bad body is an error.
    pub fn decode(value: &Value) -> Result<Option<StatBlockRecord>, SkipReason> {
        let Some(object) = value.as_object() else {
            return Ok(None);
        };
        let kind = match object.get("type").and_then(Value::as_str) {
            Some(kind) => kind.to_ascii_lowercase(),
            None => return Ok(None),
        };
        if kind != "monstermanual" && kind != "pc_class" {
            return Ok(None);
        }

        let mut normalized = object.clone();
        normalized.insert("type".to_string(), Value::String(kind));
        serde_json::from_value(Value::Object(normalized))
            .map(Some)
            .map_err(|e| SkipReason::InvalidStatBlock(e.to_string()))
    }

    /// Build the typed stat block, deriving every player-class number.
    pub fn build(self, media: &MediaLayout) -> Result<StatBlock, SkipReason> {
        match self {
            StatBlockRecord::MonsterManual { monster_name } => Ok(StatBlock::MonsterManual(
                MonsterManualReference::new(monster_name, media.monster_manual_dir()),
            )),
            StatBlockRecord::PlayerClass {
                class,
                level,
                ability_scores,
                armor_class,
                spells,
                weapons,
            } => {
                let class_name: CharacterClass = class
                    .parse()
                    .map_err(|_| SkipReason::UnknownClass(class.clone()))?;
                let pc = PlayerClass::new(class_name, level, ability_scores, spells)
                    .with_armor_class(armor_class)
                    .with_weapons(weapons);
                Ok(StatBlock::PlayerClass(pc))
            }
        }
    }
}

impl From<&StatBlock> for StatBlockRecord {
    fn from(stat_block: &StatBlock) -> Self {
        match stat_block {
            StatBlock::MonsterManual(reference) => StatBlockRecord::MonsterManual {
                monster_name: reference.monster_name.clone(),
            },
            StatBlock::PlayerClass(pc) => StatBlockRecord::PlayerClass {
                class: pc.class_name().name().to_string(),
                level: pc.level(),
                ability_scores: *pc.ability_scores(),
                armor_class: pc.armor_class_override(),
                spells: pc.spells().to_vec(),
                weapons: pc.weapons().to_vec(),
            },
        }
    }
}

// ============================================================================
// NPCs
// ============================================================================

/// An NPC as written in `npcs.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcRecord {
    pub name: String,
    pub race: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default, deserialize_with = "age_from_any")]
    pub age: String,
    pub alignment: String,
    /// Kept raw so an unknown stat block type never fails the record.
    #[serde(default)]
    pub stat_block: Option<Value>,
    #[serde(default)]
    pub appearance: String,
    #[serde(default)]
    pub backstory: String,
    #[serde(default, deserialize_with = "traits_from_any")]
    pub additional_traits: Vec<String>,
    #[serde(default)]
    pub campaign_notes: String,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

fn default_alive() -> bool {
    true
}

fn age_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Age {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Age>::deserialize(deserializer)? {
        Some(Age::Text(text)) => text,
        Some(Age::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

fn traits_from_any<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Trait {
        Text(String),
        Described { description: String },
    }

    let traits = Option::<Vec<Trait>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(traits
        .into_iter()
        .map(|t| match t {
            Trait::Text(text) => text,
            Trait::Described { description } => description,
        })
        .collect())
}

impl NpcRecord {
    /// Resolve enums and build the stat block.
    pub fn into_npc(self, media: &MediaLayout) -> Result<Npc, SkipReason> {
        let race =
            Race::parse(&self.race).ok_or_else(|| SkipReason::UnknownRace(self.race.clone()))?;
        let alignment = Alignment::parse(&self.alignment)
            .ok_or_else(|| SkipReason::UnknownAlignment(self.alignment.clone()))?;

        let stat_block = match &self.stat_block {
            Some(raw) => match StatBlockRecord::decode(raw)? {
                Some(record) => Some(record.build(media)?),
                None => None,
            },
            None => None,
        };

        Ok(Npc {
            name: self.name,
            race,
            sex: self.sex,
            age: self.age,
            alignment,
            stat_block,
            appearance: self.appearance,
            backstory: self.backstory,
            additional_traits: self.additional_traits,
            campaign_notes: self.campaign_notes,
            alive: self.alive,
            aliases: self.aliases,
        })
    }
}

impl From<&Npc> for NpcRecord {
    fn from(npc: &Npc) -> Self {
        let stat_block = npc
            .stat_block
            .as_ref()
            .map(StatBlockRecord::from)
            .and_then(|record| serde_json::to_value(record).ok());
        Self {
            name: npc.name.clone(),
            race: npc.race.label().to_string(),
            sex: npc.sex.clone(),
            age: npc.age.clone(),
            alignment: npc.alignment.label().to_string(),
            stat_block,
            appearance: npc.appearance.clone(),
            backstory: npc.backstory.clone(),
            additional_traits: npc.additional_traits.clone(),
            campaign_notes: npc.campaign_notes.clone(),
            alive: npc.alive,
            aliases: npc.aliases.clone(),
        }
    }
}

// ============================================================================
// Locations
// ============================================================================

/// A location as written in `locations.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Directly assigned NPC names. Older files call this `npc_ids`.
    #[serde(default, alias = "npc_ids")]
    pub npcs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loot: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat_block::SpellSlots;
    use serde_json::json;

    fn media() -> MediaLayout {
        MediaLayout::new("/media")
    }

    #[test]
    fn test_monster_manual_block() {
        let raw = json!({"type": "MonsterManual", "monster_name": "Goblin"});
        let block = StatBlockRecord::decode(&raw)
            .unwrap()
            .unwrap()
            .build(&media())
            .unwrap();
        match block {
            StatBlock::MonsterManual(reference) => {
                assert_eq!(reference.monster_name, "Goblin");
                assert_eq!(
                    reference.stat_block_image,
                    std::path::PathBuf::from("/media/MonsterManual/Goblin.png")
                );
            }
            other => panic!("expected monster manual, got {other:?}"),
        }
    }

    #[test]
    fn test_pc_class_block_with_string_level() {
        let raw = json!({
            "type": "pc_class",
            "class": "Cleric",
            "level": "5",
            "ability_scores": {"Wisdom": 16, "constitution": 14}
        });
        let block = StatBlockRecord::decode(&raw)
            .unwrap()
            .unwrap()
            .build(&media())
            .unwrap();
        let pc = block.as_player_class().unwrap();
        assert_eq!(pc.level(), 5);
        assert_eq!(pc.proficiency_bonus(), 3);
        assert_eq!(pc.hit_points(), 5 * (5 + 2));
        assert_eq!(pc.spell_save_dc(), 8 + 3 + 3);
        assert!(pc.spell_slots().is_defined());
    }

    #[test]
    fn test_pc_class_defaults() {
        let raw = json!({"type": "pc_class"});
        let block = StatBlockRecord::decode(&raw)
            .unwrap()
            .unwrap()
            .build(&media())
            .unwrap();
        let pc = block.as_player_class().unwrap();
        assert_eq!(pc.class_name(), CharacterClass::Wizard);
        assert_eq!(pc.level(), 1);
        assert_eq!(pc.armor_class(), 10);
    }

    #[test]
    fn test_unrecognized_or_missing_type_gives_no_block() {
        assert_eq!(StatBlockRecord::decode(&json!({"type": "homebrew"})), Ok(None));
        assert_eq!(StatBlockRecord::decode(&json!({"monster_name": "Goblin"})), Ok(None));
        assert_eq!(StatBlockRecord::decode(&Value::Null), Ok(None));
    }

    #[test]
    fn test_recognized_type_with_bad_body_is_rejected() {
        let missing_name = StatBlockRecord::decode(&json!({"type": "monstermanual"}));
        assert!(matches!(missing_name, Err(SkipReason::InvalidStatBlock(_))));

        let bad_level = StatBlockRecord::decode(&json!({"type": "pc_class", "level": "high"}));
        assert!(matches!(bad_level, Err(SkipReason::InvalidStatBlock(_))));

        let bad_class = StatBlockRecord::decode(&json!({"type": "pc_class", "class": "Artificer"}))
            .unwrap()
            .unwrap()
            .build(&media());
        assert_eq!(bad_class, Err(SkipReason::UnknownClass("Artificer".to_string())));
    }

    #[test]
    fn test_npc_record_tolerant_fields() {
        let record: NpcRecord = serde_json::from_value(json!({
            "name": "Old Tom",
            "race": "Half_Elf",
            "age": 62,
            "alignment": "Lawful Good",
            "additional_traits": ["Limps", {"description": "Hums sea shanties"}]
        }))
        .unwrap();
        assert_eq!(record.age, "62");
        assert!(record.alive);

        let npc = record.into_npc(&media()).unwrap();
        assert_eq!(npc.race, Race::HalfElf);
        assert_eq!(npc.additional_traits, vec!["Limps", "Hums sea shanties"]);
        assert!(npc.stat_block.is_none());
    }

    #[test]
    fn test_npc_record_unknown_enums() {
        let record: NpcRecord = serde_json::from_value(json!({
            "name": "Zed", "race": "Martian", "alignment": "Lawful Good"
        }))
        .unwrap();
        assert_eq!(
            record.into_npc(&media()),
            Err(SkipReason::UnknownRace("Martian".to_string()))
        );

        let record: NpcRecord = serde_json::from_value(json!({
            "name": "Zed", "race": "Human", "alignment": "lawful good"
        }))
        .unwrap();
        assert_eq!(
            record.into_npc(&media()),
            Err(SkipReason::UnknownAlignment("lawful good".to_string()))
        );
    }

    #[test]
    fn test_npc_record_from_npc_keeps_stat_block_inputs() {
        let pc = PlayerClass::new(
            CharacterClass::Wizard,
            15,
            AbilityScores::new(8, 14, 12, 18, 10, 10),
            vec!["Mage Armor".to_string()],
        )
        .with_armor_class(Some(9));
        let npc = Npc::new("Ilsa", Race::Human, Alignment::TrueNeutral)
            .with_stat_block(StatBlock::PlayerClass(pc));

        let record = NpcRecord::from(&npc);
        assert_eq!(record.race, "Human");
        assert_eq!(record.alignment, "True Neutral");
        let raw = record.stat_block.clone().unwrap();
        assert_eq!(raw["type"], "pc_class");
        assert_eq!(raw["class"], "Wizard");
        assert_eq!(raw["armor_class"], 9);

        let rebuilt = record.into_npc(&media()).unwrap();
        let pc = rebuilt.stat_block.as_ref().unwrap().as_player_class().unwrap();
        assert_eq!(pc.armor_class(), 13 + 2);
        assert!(matches!(pc.spell_slots(), SpellSlots::Undefined { .. }));
    }

    #[test]
    fn test_location_record_legacy_key() {
        let record: LocationRecord = serde_json::from_value(json!({
            "name": "Tavern",
            "npc_ids": ["Old Tom"],
            "parent": "Port"
        }))
        .unwrap();
        assert_eq!(record.npcs, vec!["Old Tom"]);
        assert_eq!(record.parent.as_deref(), Some("Port"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["npcs"], json!(["Old Tom"]));
        assert!(json.get("npc_ids").is_none());
        assert!(json.get("loot").is_none());
    }
}
