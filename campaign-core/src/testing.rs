//! Testing utilities for campaign data.
//!
//! This module provides:
//! - A small sample campaign that can be written to a scratch directory
//! - Builders for common entities
//! - Assertion helpers for load diagnostics

use crate::class_data::CharacterClass;
use crate::persist::Collection;
use crate::records::SkipReason;
use crate::repository::Repository;
use crate::spells::{Spell, DEFAULT_UPCAST_INFO};
use crate::stat_block::{PlayerClass, StatBlock};
use crate::world::{AbilityScores, Alignment, Npc, Race};
use serde_json::{json, Value};
use std::path::Path;

/// Write one collection file.
pub async fn write_collection(
    dir: &Path,
    collection: Collection,
    records: Value,
) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let content = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(collection.path_in(dir), content).await
}

/// The sample campaign, one JSON array per collection.
///
/// Port Virellon contains The Salty Hound (Old Tom, a Healing Potion) and
/// Harbor Docks (Captain Mira Vell, listed under the legacy `npc_ids` key).
pub fn sample_campaign() -> Vec<(Collection, Value)> {
    vec![
        (
            Collection::Spells,
            json!([
                {"name": "Fire Bolt", "level": 0, "school": "Evocation",
                 "casting_time": "1 action", "range": "120 feet", "components": "V, S",
                 "duration": "Instantaneous", "damage": "1d10 fire",
                 "description": "You hurl a mote of fire at a creature or object within range."},
                {"name": "Fireball", "level": 3, "school": "Evocation",
                 "casting_time": "1 action", "range": "150 feet", "components": "V, S, M",
                 "duration": "Instantaneous", "damage": "8d6 fire",
                 "description": "A bright streak flashes from your pointing finger.",
                 "upcast_info": "The damage increases by 1d6 for each slot level above 3rd."},
                {"name": "Mage Armor", "level": 1, "school": "abjuration",
                 "casting_time": "1 action", "range": "Touch", "components": "V, S, M",
                 "duration": "8 hours",
                 "description": "The target's base AC becomes 13 + its Dexterity modifier."}
            ]),
        ),
        (
            Collection::Items,
            json!([
                {"name": "Healing Potion", "rarity": "Common", "tags": ["consumable"],
                 "description": "You regain 2d4 + 2 hit points when you drink this potion.",
                 "aliases": ["potion of healing"]},
                {"name": "Flame Tongue", "rarity": "Very Rare", "attunement": true,
                 "description": "While holding this sword, you can speak its command word."}
            ]),
        ),
        (
            Collection::ClassActions,
            json!([
                {"name": "Second Wind", "description": "Regain 1d10 + fighter level hit points."},
                {"name": "Sneak Attack", "description": "Deal extra damage once per turn.",
                 "aliases": ["sneak attacks"]}
            ]),
        ),
        (
            Collection::Conditions,
            json!([
                {"name": "Prone", "description": "The creature's only movement option is to crawl."},
                {"name": "Frightened", "description": "The creature has disadvantage on ability checks."}
            ]),
        ),
        (
            Collection::Npcs,
            json!([
                {"name": "Old Tom", "race": "Human", "sex": "Male", "age": 62,
                 "alignment": "Lawful Good",
                 "stat_block": {"type": "monstermanual", "monster_name": "Commoner"},
                 "appearance": "A stooped barkeep with a limp and a ready laugh.",
                 "backstory": "Sailed for thirty years before buying the Salty Hound.",
                 "additional_traits": ["Hums sea shanties"],
                 "campaign_notes": "", "alive": true},
                {"name": "Captain Mira Vell", "race": "Half_Elf", "sex": "Female", "age": "41",
                 "alignment": "Neutral_Good",
                 "stat_block": {"type": "pc_class", "class": "Wizard", "level": "5",
                                "ability_scores": {"Intelligence": 16, "Dexterity": 14,
                                                   "Constitution": 12},
                                "spells": ["Fire Bolt", "Mage Armor"],
                                "weapons": ["Dagger"]},
                 "appearance": "Weathered, with a silver earring shaped like an anchor.",
                 "backstory": "",
                 "additional_traits": [{"description": "Never sits with her back to a door"}],
                 "campaign_notes": "Hired the party in session one.",
                 "aliases": ["Mira", "the Captain"]}
            ]),
        ),
        (
            Collection::Locations,
            json!([
                {"name": "Port Virellon", "region": "Sword Coast", "tags": ["city", "port"],
                 "description": "A salt-stained harbor town.", "npcs": []},
                {"name": "The Salty Hound", "parent": "Port Virellon", "tags": ["tavern"],
                 "description": "A cramped tavern that smells of brine.",
                 "npcs": ["Old Tom", "Nobody In Particular"], "loot": ["Healing Potion"]},
                {"name": "Harbor Docks", "parent": "Port Virellon",
                 "description": "Creaking piers and stacked crates.",
                 "npc_ids": ["Captain Mira Vell"]}
            ]),
        ),
    ]
}

/// Write [`sample_campaign`] into `dir`.
pub async fn write_sample_campaign(dir: &Path) -> std::io::Result<()> {
    for (collection, records) in sample_campaign() {
        write_collection(dir, collection, records).await?;
    }
    Ok(())
}

/// A level 5 wizard NPC with Mage Armor prepared.
pub fn sample_wizard(name: &str) -> Npc {
    let pc = PlayerClass::new(
        CharacterClass::Wizard,
        5,
        AbilityScores::new(8, 14, 12, 16, 10, 10),
        vec!["Fire Bolt".to_string(), "Mage Armor".to_string()],
    );
    Npc::new(name, Race::HalfElf, Alignment::NeutralGood)
        .with_stat_block(StatBlock::PlayerClass(pc))
        .with_appearance("Ink-stained fingers and a patient stare.")
}

/// A cantrip with the given name and description.
pub fn sample_spell(name: &str, description: &str) -> Spell {
    Spell {
        name: name.to_string(),
        level: 0,
        school: "Evocation".to_string(),
        casting_time: "1 action".to_string(),
        range: "60 feet".to_string(),
        components: "V, S".to_string(),
        duration: "Instantaneous".to_string(),
        description: description.to_string(),
        damage: None,
        upcast_info: DEFAULT_UPCAST_INFO.to_string(),
        tags: Vec::new(),
        aliases: Vec::new(),
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert that the record named `name` in `file` was skipped.
pub fn assert_skipped(repo: &Repository, file: &str, name: &str) -> SkipReason {
    match repo
        .skips()
        .iter()
        .find(|s| s.file == file && s.name.as_deref() == Some(name))
    {
        Some(skip) => skip.reason.clone(),
        None => panic!(
            "Expected {file} record '{name}' to be skipped, skips were: {:?}",
            repo.skips()
        ),
    }
}

/// Assert that nothing was skipped while loading.
pub fn assert_clean_load(repo: &Repository) {
    assert!(
        repo.skips().is_empty(),
        "Expected a clean load, skipped: {:?}",
        repo.skips()
    );
}
