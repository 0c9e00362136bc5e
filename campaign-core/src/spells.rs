//! Spell records.
//!
//! Spells are loaded from `spells.json`. Casting time, range, components and
//! duration are kept as the free text the campaign author typed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upcast text used when a record does not provide one.
pub const DEFAULT_UPCAST_INFO: &str =
    "Casting this spell at higher levels provides no additional benefit.";

/// Schools of magic in D&D.
///
/// Spell records store the school as free text; this is the parsed view of
/// the eight standard schools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpellSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
}

impl SpellSchool {
    pub const ALL: [SpellSchool; 8] = [
        SpellSchool::Abjuration,
        SpellSchool::Conjuration,
        SpellSchool::Divination,
        SpellSchool::Enchantment,
        SpellSchool::Evocation,
        SpellSchool::Illusion,
        SpellSchool::Necromancy,
        SpellSchool::Transmutation,
    ];

    /// Case-insensitive match against the standard school names.
    pub fn parse(text: &str) -> Option<SpellSchool> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|school| school.name().eq_ignore_ascii_case(text))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpellSchool::Abjuration => "Abjuration",
            SpellSchool::Conjuration => "Conjuration",
            SpellSchool::Divination => "Divination",
            SpellSchool::Enchantment => "Enchantment",
            SpellSchool::Evocation => "Evocation",
            SpellSchool::Illusion => "Illusion",
            SpellSchool::Necromancy => "Necromancy",
            SpellSchool::Transmutation => "Transmutation",
        }
    }
}

impl fmt::Display for SpellSchool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn default_upcast_info() -> String {
    DEFAULT_UPCAST_INFO.to_string()
}

/// A spell as stored in `spells.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    /// Spell level; 0 for cantrips.
    pub level: u8,
    /// Free text; homebrew schools are kept as written.
    pub school: String,
    pub casting_time: String,
    pub range: String,
    pub components: String,
    pub duration: String,
    pub description: String,
    #[serde(default)]
    pub damage: Option<String>,
    #[serde(default = "default_upcast_info")]
    pub upcast_info: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Spell {
    /// The standard school this spell belongs to, if it names one.
    pub fn school_kind(&self) -> Option<SpellSchool> {
        SpellSchool::parse(&self.school)
    }

    /// Canonical school name for standard schools, the raw text otherwise.
    pub fn school_label(&self) -> &str {
        match self.school_kind() {
            Some(school) => school.name(),
            None => self.school.trim(),
        }
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }

    /// "Evocation cantrip" or "3rd-level Evocation".
    pub fn level_line(&self) -> String {
        let school = self.school_label();
        match self.level {
            0 => format!("{school} cantrip"),
            1 => format!("1st-level {school}"),
            2 => format!("2nd-level {school}"),
            3 => format!("3rd-level {school}"),
            n => format!("{n}th-level {school}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_defaults() {
        let spell: Spell = serde_json::from_str(
            r#"{
                "name": "Fire Bolt",
                "level": 0,
                "school": "Evocation",
                "casting_time": "1 action",
                "range": "120 feet",
                "components": "V, S",
                "duration": "Instantaneous",
                "description": "A mote of fire.",
                "damage": "1d10 fire"
            }"#,
        )
        .unwrap();

        assert!(spell.is_cantrip());
        assert_eq!(spell.upcast_info, DEFAULT_UPCAST_INFO);
        assert!(spell.aliases.is_empty());
        assert_eq!(spell.damage.as_deref(), Some("1d10 fire"));
        assert_eq!(spell.level_line(), "Evocation cantrip");
    }

    #[test]
    fn test_free_text_school_loads() {
        let homebrew: Spell = serde_json::from_str(
            r#"{"name": "Chronal Shift", "level": 2, "school": "Chronomancy",
                "casting_time": "1 reaction", "range": "Self", "components": "V",
                "duration": "1 round", "description": "Time stutters."}"#,
        )
        .unwrap();
        assert_eq!(homebrew.school, "Chronomancy");
        assert_eq!(homebrew.school_kind(), None);
        assert_eq!(homebrew.level_line(), "2nd-level Chronomancy");

        let shouted: Spell = serde_json::from_value(serde_json::json!({
            "name": "Fire Bolt", "level": 0, "school": "EVOCATION", "casting_time": "1 action",
            "range": "120 feet", "components": "V, S", "duration": "Instantaneous",
            "description": "A mote of fire."
        }))
        .unwrap();
        assert_eq!(shouted.school_kind(), Some(SpellSchool::Evocation));
        assert_eq!(shouted.level_line(), "Evocation cantrip");
    }

    #[test]
    fn test_level_line() {
        let mut spell: Spell = serde_json::from_value(serde_json::json!({
            "name": "Fireball", "level": 3, "school": "evocation", "casting_time": "1 action",
            "range": "150 feet", "components": "V, S, M", "duration": "Instantaneous",
            "description": "Boom."
        }))
        .unwrap();
        assert_eq!(spell.level_line(), "3rd-level Evocation");
        spell.level = 5;
        assert_eq!(spell.level_line(), "5th-level Evocation");
    }
}
