//! Campaign data repository for tabletop RPG sessions.
//!
//! This crate provides:
//! - Tolerant loading of spells, items, class actions, conditions, NPCs and locations
//! - Player-class stat blocks with derived combat numbers
//! - A location hierarchy whose NPC lists include every sub-location
//! - A knowledge base that links entity names in prose
//! - Whole-file JSON persistence with upsert-by-name
//!
//! # Quick Start
//!
//! ```ignore
//! use campaign_core::{KnowledgeBase, Repository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = Repository::load_all("Data").await?;
//!     for skip in repo.skips() {
//!         eprintln!("skipped {skip}");
//!     }
//!
//!     let kb = KnowledgeBase::from_repository(&repo);
//!     println!("{}", kb.linkify("Old Tom casts Fire Bolt"));
//!     Ok(())
//! }
//! ```

pub mod class_data;
pub mod config;
pub mod items;
pub mod knowledge_base;
pub mod location;
pub mod persist;
pub mod records;
pub mod repository;
pub mod spells;
pub mod stat_block;
pub mod testing;
pub mod world;

// Primary public API
pub use class_data::{CasterType, CharacterClass};
pub use config::{CampaignConfig, MediaKind, MediaLayout};
pub use items::{Item, Rarity};
pub use knowledge_base::{KbContent, KbEntry, KnowledgeBase};
pub use location::{Location, LocationId, LocationTree};
pub use persist::{Collection, PersistError};
pub use records::SkipReason;
pub use repository::{Repository, RepositoryError, SkipDiagnostic};
pub use spells::{Spell, SpellSchool};
pub use stat_block::{PlayerClass, SpellSlots, StatBlock};
pub use world::{AbilityScores, Alignment, ClassAction, Condition, Npc, NpcId, Race};
