//! The campaign repository.
//!
//! Loads the six collection files of a data directory into a typed graph:
//! flat records first, then NPCs, then locations (which refer to NPCs and
//! items by name). Individual bad records are skipped and reported through
//! [`Repository::skips`]; only a corrupt file aborts the load.

use crate::config::{CampaignConfig, MediaLayout};
use crate::items::{Item, ItemId};
use crate::location::{Location, LocationError, LocationId, LocationTree};
use crate::persist::{self, Collection, PersistError};
use crate::records::{LocationRecord, NpcRecord, SkipReason};
use crate::spells::Spell;
use crate::world::{AbilityScores, ClassAction, Condition, Npc, NpcId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from loading or editing a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} is malformed: {message}")]
    Malformed { file: &'static str, message: String },

    #[error("no NPC named '{0}'")]
    UnknownNpc(String),

    #[error("no location named '{0}'")]
    UnknownLocation(String),

    #[error("an NPC named '{0}' already exists")]
    DuplicateNpc(String),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl RepositoryError {
    fn from_read(collection: Collection, err: PersistError) -> Self {
        let file = collection.file_name();
        match err {
            PersistError::Io(source) => RepositoryError::Io { file, source },
            PersistError::Json(e) => RepositoryError::Malformed {
                file,
                message: e.to_string(),
            },
            PersistError::NotAnArray(_) => RepositoryError::Malformed {
                file,
                message: "top-level value is not an array".to_string(),
            },
            other => RepositoryError::Persist(other),
        }
    }
}

// ============================================================================
// Skip diagnostics
// ============================================================================

/// One skipped record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipDiagnostic {
    pub file: &'static str,
    /// Position in the file's array.
    pub index: usize,
    pub name: Option<String>,
    pub reason: SkipReason,
}

impl fmt::Display for SkipDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[{}] '{}': {}", self.file, self.index, name, self.reason),
            None => write!(f, "{}[{}]: {}", self.file, self.index, self.reason),
        }
    }
}

// ============================================================================
// Repository
// ============================================================================

/// A loaded campaign.
#[derive(Debug, Clone)]
pub struct Repository {
    data_dir: PathBuf,
    media: MediaLayout,

    spells: Vec<Spell>,
    items: Vec<Item>,
    class_actions: Vec<ClassAction>,
    conditions: Vec<Condition>,
    npcs: Vec<Npc>,
    locations: LocationTree,

    spell_index: HashMap<String, usize>,
    item_index: HashMap<String, ItemId>,
    class_action_index: HashMap<String, usize>,
    condition_index: HashMap<String, usize>,
    npc_index: HashMap<String, NpcId>,

    skips: Vec<SkipDiagnostic>,
}

/// Raw arrays of all six files, in load order.
struct RawCampaign {
    spells: Vec<Value>,
    items: Vec<Value>,
    class_actions: Vec<Value>,
    conditions: Vec<Value>,
    npcs: Vec<Value>,
    locations: Vec<Value>,
}

async fn read_collection(
    data_dir: &Path,
    collection: Collection,
) -> Result<Vec<Value>, RepositoryError> {
    persist::read_array(collection.path_in(data_dir))
        .await
        .map_err(|e| RepositoryError::from_read(collection, e))
}

fn record_name(value: &Value) -> Option<String> {
    value.get("name").and_then(Value::as_str).map(String::from)
}

/// Build a name index where later records win.
fn index_by_name<'a, I, T>(names: I, wrap: impl Fn(usize) -> T) -> HashMap<String, T>
where
    I: Iterator<Item = &'a str>,
{
    names
        .enumerate()
        .map(|(i, name)| (name.to_string(), wrap(i)))
        .collect()
}

impl Repository {
    /// An empty campaign for the configured directories.
    pub fn new(config: &CampaignConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            media: config.media(),
            spells: Vec::new(),
            items: Vec::new(),
            class_actions: Vec::new(),
            conditions: Vec::new(),
            npcs: Vec::new(),
            locations: LocationTree::new(),
            spell_index: HashMap::new(),
            item_index: HashMap::new(),
            class_action_index: HashMap::new(),
            condition_index: HashMap::new(),
            npc_index: HashMap::new(),
            skips: Vec::new(),
        }
    }

    /// Load a data directory with the default media directory.
    pub async fn load_all(data_dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        Self::load(&CampaignConfig::new(data_dir)).await
    }

    pub async fn load(config: &CampaignConfig) -> Result<Self, RepositoryError> {
        let dir = config.data_dir.as_path();
        let (spells, items, class_actions, conditions, npcs, locations) = futures::try_join!(
            read_collection(dir, Collection::Spells),
            read_collection(dir, Collection::Items),
            read_collection(dir, Collection::ClassActions),
            read_collection(dir, Collection::Conditions),
            read_collection(dir, Collection::Npcs),
            read_collection(dir, Collection::Locations),
        )?;

        let mut repo = Self::new(config);
        repo.build(RawCampaign {
            spells,
            items,
            class_actions,
            conditions,
            npcs,
            locations,
        });

        info!(
            data_dir = %dir.display(),
            spells = repo.spells.len(),
            items = repo.items.len(),
            class_actions = repo.class_actions.len(),
            conditions = repo.conditions.len(),
            npcs = repo.npcs.len(),
            locations = repo.locations.len(),
            skipped = repo.skips.len(),
            "loaded campaign"
        );
        Ok(repo)
    }

    fn build(&mut self, raw: RawCampaign) {
        self.spells = self.decode_flat(Collection::Spells, raw.spells);
        self.items = self.decode_flat(Collection::Items, raw.items);
        self.class_actions = self.decode_flat(Collection::ClassActions, raw.class_actions);
        self.conditions = self.decode_flat(Collection::Conditions, raw.conditions);
        self.reindex_flat();

        self.build_npcs(raw.npcs);
        self.build_locations(raw.locations);
    }

    fn skip(
        &mut self,
        collection: Collection,
        index: usize,
        name: Option<String>,
        reason: SkipReason,
    ) {
        let diagnostic = SkipDiagnostic {
            file: collection.file_name(),
            index,
            name,
            reason,
        };
        warn!(%diagnostic, "skipping record");
        self.skips.push(diagnostic);
    }

    fn decode_flat<T: DeserializeOwned>(
        &mut self,
        collection: Collection,
        values: Vec<Value>,
    ) -> Vec<T> {
        let mut out = Vec::with_capacity(values.len());
        for (index, value) in values.into_iter().enumerate() {
            let name = record_name(&value);
            match serde_json::from_value(value) {
                Ok(record) => out.push(record),
                Err(e) => self.skip(collection, index, name, SkipReason::Malformed(e.to_string())),
            }
        }
        out
    }

    fn reindex_flat(&mut self) {
        self.spell_index = index_by_name(self.spells.iter().map(|s| s.name.as_str()), |i| i);
        self.item_index = index_by_name(self.items.iter().map(|s| s.name.as_str()), ItemId);
        self.class_action_index =
            index_by_name(self.class_actions.iter().map(|s| s.name.as_str()), |i| i);
        self.condition_index =
            index_by_name(self.conditions.iter().map(|s| s.name.as_str()), |i| i);
    }

    fn build_npcs(&mut self, values: Vec<Value>) {
        for (index, value) in values.into_iter().enumerate() {
            let name = record_name(&value);
            let record: NpcRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    let reason = SkipReason::Malformed(e.to_string());
                    self.skip(Collection::Npcs, index, name, reason);
                    continue;
                }
            };
            if self.npc_index.contains_key(&record.name) {
                self.skip(Collection::Npcs, index, name, SkipReason::DuplicateName);
                continue;
            }
            match record.into_npc(&self.media) {
                Ok(npc) => {
                    let id = NpcId(self.npcs.len());
                    self.npc_index.insert(npc.name.clone(), id);
                    self.npcs.push(npc);
                }
                Err(reason) => self.skip(Collection::Npcs, index, name, reason),
            }
        }
    }

    fn build_locations(&mut self, values: Vec<Value>) {
        // Shells
        let mut built: Vec<(usize, LocationId, LocationRecord)> = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            let name = record_name(&value);
            let record: LocationRecord = match serde_json::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    let reason = SkipReason::Malformed(e.to_string());
                    self.skip(Collection::Locations, index, name, reason);
                    continue;
                }
            };
            let mut location = Location::new(record.name.clone(), record.description.clone())
                .with_tags(record.tags.clone());
            location.region = record.region.clone();
            match self.locations.insert(location) {
                Ok(id) => built.push((index, id, record)),
                Err(_) => self.skip(Collection::Locations, index, name, SkipReason::DuplicateName),
            }
        }

        // NPCs and loot
        for (_, id, record) in &built {
            for npc_name in &record.npcs {
                match self.npc_index.get(npc_name) {
                    Some(npc) => {
                        self.locations.assign_npc(*id, *npc);
                    }
                    None => {
                        debug!(location = %record.name, npc = %npc_name, "unknown NPC in location")
                    }
                }
            }
            for item_name in &record.loot {
                match self.item_index.get(item_name) {
                    Some(item) => {
                        self.locations.add_loot(*id, *item);
                    }
                    None => debug!(location = %record.name, item = %item_name, "unknown loot item"),
                }
            }
        }

        // Parents
        for (index, id, record) in &built {
            let Some(parent_name) = &record.parent else {
                continue;
            };
            let Some(parent) = self.locations.find(parent_name) else {
                debug!(location = %record.name, parent = %parent_name, "unknown parent location");
                continue;
            };
            if self.locations.set_parent(*id, Some(parent)).is_err() {
                self.skip(
                    Collection::Locations,
                    *index,
                    Some(record.name.clone()),
                    SkipReason::ParentCycle(parent_name.clone()),
                );
            }
        }

        self.locations.propagate_npcs();
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn media(&self) -> &MediaLayout {
        &self.media
    }

    pub fn spells(&self) -> &[Spell] {
        &self.spells
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn class_actions(&self) -> &[ClassAction] {
        &self.class_actions
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn locations(&self) -> &LocationTree {
        &self.locations
    }

    pub fn skips(&self) -> &[SkipDiagnostic] {
        &self.skips
    }

    pub fn spell(&self, name: &str) -> Option<&Spell> {
        self.spell_index.get(name).map(|&i| &self.spells[i])
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.item_index.get(name).and_then(|&id| self.item_by_id(id))
    }

    pub fn item_by_id(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0)
    }

    pub fn class_action(&self, name: &str) -> Option<&ClassAction> {
        self.class_action_index
            .get(name)
            .map(|&i| &self.class_actions[i])
    }

    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.condition_index.get(name).map(|&i| &self.conditions[i])
    }

    pub fn npc(&self, name: &str) -> Option<&Npc> {
        self.npc_id(name).and_then(|id| self.npc_by_id(id))
    }

    pub fn npc_id(&self, name: &str) -> Option<NpcId> {
        self.npc_index.get(name).copied()
    }

    pub fn npc_by_id(&self, id: NpcId) -> Option<&Npc> {
        self.npcs.get(id.0)
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.by_name(name)
    }

    pub fn top_level_locations(&self) -> Vec<&Location> {
        self.locations
            .top_level()
            .into_iter()
            .filter_map(|id| self.locations.get(id))
            .collect()
    }

    pub fn children_of(&self, name: &str) -> Vec<&Location> {
        match self.locations.find(name) {
            Some(id) => self
                .locations
                .children(id)
                .into_iter()
                .filter_map(|child| self.locations.get(child))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Names for a list of NPC handles, e.g. a location's NPC list.
    pub fn npc_names(&self, ids: &[NpcId]) -> Vec<&str> {
        ids.iter()
            .filter_map(|id| self.npc_by_id(*id))
            .map(|npc| npc.name.as_str())
            .collect()
    }

    /// The `npcs.json` form of an NPC.
    pub fn npc_record(&self, name: &str) -> Option<NpcRecord> {
        self.npc(name).map(NpcRecord::from)
    }

    /// The `locations.json` form of a location, with directly assigned NPCs only.
    pub fn location_record(&self, name: &str) -> Option<LocationRecord> {
        let location = self.locations.by_name(name)?;
        Some(LocationRecord {
            name: location.name.clone(),
            description: location.description.clone(),
            region: location.region.clone(),
            tags: location.tags.clone(),
            npcs: self
                .npc_names(location.assigned_npcs())
                .into_iter()
                .map(String::from)
                .collect(),
            loot: location
                .loot
                .iter()
                .filter_map(|id| self.item_by_id(*id))
                .map(|item| item.name.clone())
                .collect(),
            parent: location
                .parent()
                .and_then(|p| self.locations.get(p))
                .map(|p| p.name.clone()),
        })
    }

    // ========================================================================
    // Edits
    // ========================================================================

    fn require_npc(&self, name: &str) -> Result<NpcId, RepositoryError> {
        self.npc_id(name)
            .ok_or_else(|| RepositoryError::UnknownNpc(name.to_string()))
    }

    fn require_location(&self, name: &str) -> Result<LocationId, RepositoryError> {
        self.locations
            .find(name)
            .ok_or_else(|| RepositoryError::UnknownLocation(name.to_string()))
    }

    /// Replace an NPC. Renames keep every location membership.
    pub fn edit_npc(&mut self, original_name: &str, npc: Npc) -> Result<NpcId, RepositoryError> {
        let id = self.require_npc(original_name)?;
        if npc.name != original_name {
            if self.npc_index.contains_key(&npc.name) {
                return Err(RepositoryError::DuplicateNpc(npc.name));
            }
            self.npc_index.remove(original_name);
            self.npc_index.insert(npc.name.clone(), id);
        }
        self.npcs[id.0] = npc;
        Ok(id)
    }

    /// Add an NPC that is not in the campaign yet.
    pub fn add_npc(&mut self, npc: Npc) -> Result<NpcId, RepositoryError> {
        if self.npc_index.contains_key(&npc.name) {
            return Err(RepositoryError::DuplicateNpc(npc.name));
        }
        let id = NpcId(self.npcs.len());
        self.npc_index.insert(npc.name.clone(), id);
        self.npcs.push(npc);
        Ok(id)
    }

    /// Re-derive a player-class stat block from new inputs.
    ///
    /// Returns `false` when the NPC has no player-class stat block.
    pub fn update_pc_class(
        &mut self,
        npc_name: &str,
        level: u8,
        ability_scores: AbilityScores,
        spells: Vec<String>,
    ) -> Result<bool, RepositoryError> {
        let id = self.require_npc(npc_name)?;
        let Some(pc) = self.npcs[id.0]
            .stat_block
            .as_mut()
            .and_then(|block| block.as_player_class_mut())
        else {
            return Ok(false);
        };
        pc.set_level(level);
        pc.set_ability_scores(ability_scores);
        pc.set_spells(spells);
        Ok(true)
    }

    pub fn set_campaign_notes(
        &mut self,
        npc_name: &str,
        notes: impl Into<String>,
    ) -> Result<(), RepositoryError> {
        let id = self.require_npc(npc_name)?;
        self.npcs[id.0].campaign_notes = notes.into();
        Ok(())
    }

    pub fn set_alive(&mut self, npc_name: &str, alive: bool) -> Result<(), RepositoryError> {
        let id = self.require_npc(npc_name)?;
        self.npcs[id.0].alive = alive;
        Ok(())
    }

    /// Assign an NPC to a location and refresh inherited lists.
    ///
    /// Returns `false` if the NPC was already assigned there.
    pub fn add_npc_to_location(
        &mut self,
        location: &str,
        npc_name: &str,
    ) -> Result<bool, RepositoryError> {
        let loc = self.require_location(location)?;
        let npc = self.require_npc(npc_name)?;
        let added = self.locations.assign_npc(loc, npc);
        self.locations.propagate_npcs();
        Ok(added)
    }

    pub fn remove_npc_from_location(
        &mut self,
        location: &str,
        npc_name: &str,
    ) -> Result<bool, RepositoryError> {
        let loc = self.require_location(location)?;
        let npc = self.require_npc(npc_name)?;
        let removed = self.locations.unassign_npc(loc, npc);
        self.locations.propagate_npcs();
        Ok(removed)
    }

    /// Move a location under another one, or to the top level with `None`.
    pub fn set_location_parent(
        &mut self,
        location: &str,
        parent: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let loc = self.require_location(location)?;
        let parent = parent.map(|name| self.require_location(name)).transpose()?;
        self.locations.set_parent(loc, parent)?;
        self.locations.propagate_npcs();
        Ok(())
    }

    // ========================================================================
    // Saving
    // ========================================================================

    /// Write an NPC back to `npcs.json`, replacing the record stored under
    /// `original_name`. After a rename, the locations that list the NPC are
    /// rewritten too so they keep pointing at it.
    pub async fn save_npc(
        &self,
        original_name: &str,
        current_name: &str,
    ) -> Result<(), RepositoryError> {
        let id = self.require_npc(current_name)?;
        let record = NpcRecord::from(&self.npcs[id.0]);
        persist::save_npc(&self.data_dir, original_name, &record).await?;

        if original_name != current_name {
            for (_, location) in self.locations.iter() {
                if location.assigned_npcs().contains(&id) {
                    self.save_location_assignments(&location.name).await?;
                }
            }
        }
        Ok(())
    }

    pub async fn save_campaign_notes(&self, npc_name: &str) -> Result<(), RepositoryError> {
        let id = self.require_npc(npc_name)?;
        let notes = &self.npcs[id.0].campaign_notes;
        persist::update_campaign_notes(&self.data_dir, npc_name, notes).await?;
        Ok(())
    }

    pub async fn save_location(
        &self,
        original_name: &str,
        current_name: &str,
    ) -> Result<(), RepositoryError> {
        let record = self
            .location_record(current_name)
            .ok_or_else(|| RepositoryError::UnknownLocation(current_name.to_string()))?;
        persist::save_location(&self.data_dir, original_name, &record).await?;
        Ok(())
    }

    pub async fn save_location_assignments(&self, location: &str) -> Result<(), RepositoryError> {
        let id = self.require_location(location)?;
        let names: Vec<String> = self
            .locations
            .get(id)
            .map(|loc| self.npc_names(loc.assigned_npcs()))
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .collect();
        persist::save_location_assignments(&self.data_dir, location, &names).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{write_collection, write_sample_campaign};
    use crate::world::Race;
    use serde_json::json;

    #[tokio::test]
    async fn test_empty_directory_loads_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        assert!(repo.spells().is_empty());
        assert!(repo.npcs().is_empty());
        assert!(repo.locations().is_empty());
        assert!(repo.skips().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_npc_is_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(
            temp_dir.path(),
            Collection::Npcs,
            json!([
                {"name": "Old Tom", "race": "Human", "alignment": "Lawful Good"},
                {"race": "Elf", "alignment": "Chaotic Good"}
            ]),
        )
        .await
        .unwrap();

        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        assert_eq!(repo.npcs().len(), 1);
        assert_eq!(repo.skips().len(), 1);
        let skip = &repo.skips()[0];
        assert_eq!(skip.file, "npcs.json");
        assert_eq!(skip.index, 1);
        assert!(matches!(skip.reason, SkipReason::Malformed(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file_aborts() {
        let temp_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(temp_dir.path().join("spells.json"), "[{\"name\": ")
            .await
            .unwrap();
        let result = Repository::load_all(temp_dir.path()).await;
        assert!(matches!(
            result,
            Err(RepositoryError::Malformed { file: "spells.json", .. })
        ));

        tokio::fs::write(temp_dir.path().join("spells.json"), "{}")
            .await
            .unwrap();
        let result = Repository::load_all(temp_dir.path()).await;
        assert!(matches!(result, Err(RepositoryError::Malformed { .. })));
    }

    #[tokio::test]
    async fn test_duplicate_npc_and_unknown_stat_block() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(
            temp_dir.path(),
            Collection::Npcs,
            json!([
                {"name": "Mira", "race": "Elf", "alignment": "Neutral Good",
                 "stat_block": {"type": "homebrew"}},
                {"name": "Mira", "race": "Dwarf", "alignment": "Neutral Good"},
                {"name": "Brask", "race": "Half-Orc", "alignment": "Chaotic Neutral",
                 "stat_block": {"type": "MONSTERMANUAL"}}
            ]),
        )
        .await
        .unwrap();

        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        let mira = repo.npc("Mira").unwrap();
        assert_eq!(mira.race, Race::Elf);
        assert!(mira.stat_block.is_none());
        assert!(repo.npc("Brask").is_none());

        let reasons: Vec<_> = repo.skips().iter().map(|s| &s.reason).collect();
        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons[0], &SkipReason::DuplicateName);
        assert!(matches!(reasons[1], SkipReason::InvalidStatBlock(_)));
    }

    #[tokio::test]
    async fn test_flat_duplicates_last_write_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(
            temp_dir.path(),
            Collection::Conditions,
            json!([
                {"name": "Prone", "description": "first"},
                {"name": "Prone", "description": "second"},
                {"name": "Blinded"}
            ]),
        )
        .await
        .unwrap();

        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        assert_eq!(repo.conditions().len(), 2);
        assert_eq!(repo.condition("Prone").unwrap().description, "second");
        assert_eq!(repo.skips()[0].name.as_deref(), Some("Blinded"));
    }

    #[tokio::test]
    async fn test_location_graph() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();

        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        let top: Vec<_> = repo.top_level_locations().iter().map(|l| l.name.clone()).collect();
        assert_eq!(top, vec!["Port Virellon"]);

        let port = repo.location("Port Virellon").unwrap();
        assert_eq!(repo.npc_names(port.npcs()), vec!["Old Tom", "Captain Mira Vell"]);
        assert!(port.assigned_npcs().is_empty());

        let children: Vec<_> = repo
            .children_of("Port Virellon")
            .iter()
            .map(|l| l.name.clone())
            .collect();
        assert_eq!(children, vec!["The Salty Hound", "Harbor Docks"]);

        let tavern = repo.location("The Salty Hound").unwrap();
        assert_eq!(tavern.loot.len(), 1);
    }

    #[tokio::test]
    async fn test_parent_cycle_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_collection(
            temp_dir.path(),
            Collection::Locations,
            json!([
                {"name": "A", "parent": "B"},
                {"name": "B", "parent": "A"},
                {"name": "C", "parent": "C"},
                {"name": "D", "parent": "Nowhere"}
            ]),
        )
        .await
        .unwrap();

        let repo = Repository::load_all(temp_dir.path()).await.unwrap();
        assert_eq!(repo.locations().len(), 4);
        let cycles: Vec<_> = repo
            .skips()
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::ParentCycle(_)))
            .map(|s| s.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(cycles, vec!["B", "C"]);
        assert!(repo.location("D").unwrap().parent().is_none());
    }

    #[tokio::test]
    async fn test_edit_npc_rename_keeps_memberships() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();
        let mut repo = Repository::load_all(temp_dir.path()).await.unwrap();

        let mut tom = repo.npc("Old Tom").unwrap().clone();
        tom.name = "Tom Barrow".to_string();
        let id = repo.edit_npc("Old Tom", tom).unwrap();

        assert!(repo.npc("Old Tom").is_none());
        assert_eq!(repo.npc_id("Tom Barrow"), Some(id));
        let tavern = repo.location("The Salty Hound").unwrap();
        assert_eq!(repo.npc_names(tavern.assigned_npcs()), vec!["Tom Barrow"]);

        let mut clash = repo.npc("Tom Barrow").unwrap().clone();
        clash.name = "Captain Mira Vell".to_string();
        assert!(matches!(
            repo.edit_npc("Tom Barrow", clash),
            Err(RepositoryError::DuplicateNpc(_))
        ));
    }

    #[tokio::test]
    async fn test_add_npc_rejects_duplicates_and_saves() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();
        let mut repo = Repository::load_all(temp_dir.path()).await.unwrap();
        let before = repo.npcs().len();

        let id = repo
            .add_npc(crate::testing::sample_wizard("Brother Alden"))
            .unwrap();
        assert_eq!(repo.npc_id("Brother Alden"), Some(id));
        assert_eq!(repo.npcs().len(), before + 1);

        assert!(matches!(
            repo.add_npc(crate::testing::sample_wizard("Old Tom")),
            Err(RepositoryError::DuplicateNpc(name)) if name == "Old Tom"
        ));
        assert_eq!(repo.npcs().len(), before + 1);
        assert_eq!(repo.npc("Old Tom").unwrap().age, "62");

        assert!(repo.add_npc_to_location("Harbor Docks", "Brother Alden").unwrap());
        repo.save_npc("Brother Alden", "Brother Alden").await.unwrap();
        repo.save_location_assignments("Harbor Docks").await.unwrap();

        let reloaded = Repository::load_all(temp_dir.path()).await.unwrap();
        assert!(reloaded.npc("Brother Alden").is_some());
        let port = reloaded.location("Port Virellon").unwrap();
        assert!(reloaded.npc_names(port.npcs()).contains(&"Brother Alden"));
    }

    #[tokio::test]
    async fn test_update_pc_class_rederives() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();
        let mut repo = Repository::load_all(temp_dir.path()).await.unwrap();

        let scores = AbilityScores::new(10, 14, 14, 18, 12, 10);
        let updated = repo
            .update_pc_class("Captain Mira Vell", 9, scores, vec!["Mage Armor".to_string()])
            .unwrap();
        assert!(updated);

        let pc = repo
            .npc("Captain Mira Vell")
            .and_then(|n| n.stat_block.as_ref())
            .and_then(|b| b.as_player_class())
            .unwrap();
        assert_eq!(pc.level(), 9);
        assert_eq!(pc.proficiency_bonus(), 4);
        assert_eq!(pc.armor_class(), 15);
        assert_eq!(pc.spell_save_dc(), 8 + 4 + 4);

        assert!(!repo.update_pc_class("Old Tom", 2, scores, Vec::new()).unwrap());
        assert!(matches!(
            repo.update_pc_class("Nobody", 2, scores, Vec::new()),
            Err(RepositoryError::UnknownNpc(_))
        ));
    }

    #[tokio::test]
    async fn test_location_edits_repropagate() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();
        let mut repo = Repository::load_all(temp_dir.path()).await.unwrap();

        assert!(repo.remove_npc_from_location("The Salty Hound", "Old Tom").unwrap());
        let port = repo.location("Port Virellon").unwrap();
        assert_eq!(repo.npc_names(port.npcs()), vec!["Captain Mira Vell"]);

        assert!(repo.add_npc_to_location("Harbor Docks", "Old Tom").unwrap());
        assert!(!repo.add_npc_to_location("Harbor Docks", "Old Tom").unwrap());
        let port = repo.location("Port Virellon").unwrap();
        assert_eq!(port.npcs().len(), 2);

        repo.set_location_parent("Harbor Docks", None).unwrap();
        let port = repo.location("Port Virellon").unwrap();
        assert_eq!(repo.npc_names(port.npcs()), Vec::<&str>::new());
        assert!(matches!(
            repo.set_location_parent("Port Virellon", Some("The Salty Hound")),
            Err(RepositoryError::Location(LocationError::Cycle { .. }))
        ));
    }

    #[tokio::test]
    async fn test_save_renamed_npc_updates_locations() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_sample_campaign(temp_dir.path()).await.unwrap();
        let mut repo = Repository::load_all(temp_dir.path()).await.unwrap();

        let mut tom = repo.npc("Old Tom").unwrap().clone();
        tom.name = "Tom Barrow".to_string();
        repo.edit_npc("Old Tom", tom).unwrap();
        repo.set_campaign_notes("Tom Barrow", "Knows about the smugglers").unwrap();
        repo.save_npc("Old Tom", "Tom Barrow").await.unwrap();

        let reloaded = Repository::load_all(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.npcs().len(), repo.npcs().len());
        assert_eq!(
            reloaded.npc("Tom Barrow").unwrap().campaign_notes,
            "Knows about the smugglers"
        );
        let tavern = reloaded.location("The Salty Hound").unwrap();
        assert_eq!(reloaded.npc_names(tavern.assigned_npcs()), vec!["Tom Barrow"]);
        assert!(reloaded.skips().is_empty());
    }
}
