//! Collection file persistence.
//!
//! Every collection is one JSON array in the data directory. Saving a record
//! reads the whole array, replaces the record with the same (original) name
//! or appends it, and rewrites the file through a temp file renamed over the
//! target.

use crate::items::Item;
use crate::records::{LocationRecord, NpcRecord};
use crate::spells::Spell;
use crate::world::{ClassAction, Condition};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} does not contain a JSON array")]
    NotAnArray(PathBuf),

    #[error("no record named '{name}' in {file}")]
    RecordNotFound { file: &'static str, name: String },
}

/// The six collection files of a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Spells,
    Items,
    ClassActions,
    Conditions,
    Npcs,
    Locations,
}

impl Collection {
    pub fn file_name(&self) -> &'static str {
        match self {
            Collection::Spells => "spells.json",
            Collection::Items => "items.json",
            Collection::ClassActions => "class_actions.json",
            Collection::Conditions => "conditions.json",
            Collection::Npcs => "npcs.json",
            Collection::Locations => "locations.json",
        }
    }

    pub fn path_in(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(self.file_name())
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

// ============================================================================
// Whole-file access
// ============================================================================

/// Read a collection file as raw records. A missing file is an empty array.
pub async fn read_array(path: impl AsRef<Path>) -> Result<Vec<Value>, PersistError> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str(&content)? {
        Value::Array(records) => Ok(records),
        _ => Err(PersistError::NotAnArray(path.to_path_buf())),
    }
}

/// Replace a file's contents without ever leaving it half-written.
pub async fn write_atomic(path: impl AsRef<Path>, content: &str) -> Result<(), PersistError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, content).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

pub async fn write_array(path: impl AsRef<Path>, records: &[Value]) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(records)?;
    write_atomic(path, &content).await
}

fn record_name(record: &Value) -> Option<&str> {
    record.get("name").and_then(Value::as_str)
}

/// Insert or replace one record, matched by `original_name`.
pub async fn upsert_record<T: Serialize>(
    data_dir: impl AsRef<Path>,
    collection: Collection,
    original_name: &str,
    record: &T,
) -> Result<(), PersistError> {
    let path = collection.path_in(data_dir);
    let mut records = read_array(&path).await?;
    let value = serde_json::to_value(record)?;

    match records
        .iter()
        .position(|r| record_name(r) == Some(original_name))
    {
        Some(index) => records[index] = value,
        None => records.push(value),
    }
    write_array(&path, &records).await
}

/// Apply `update` to the record named `name`, leaving every other field as it was on disk.
async fn patch_record(
    data_dir: impl AsRef<Path>,
    collection: Collection,
    name: &str,
    update: impl FnOnce(&mut serde_json::Map<String, Value>),
) -> Result<(), PersistError> {
    let path = collection.path_in(data_dir);
    let mut records = read_array(&path).await?;
    let record = records
        .iter_mut()
        .find(|r| record_name(r) == Some(name))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| PersistError::RecordNotFound {
            file: collection.file_name(),
            name: name.to_string(),
        })?;
    update(record);
    write_array(&path, &records).await
}

// ============================================================================
// Per-collection saves
// ============================================================================

pub async fn save_spell(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    spell: &Spell,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::Spells, original_name, spell).await
}

pub async fn save_item(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    item: &Item,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::Items, original_name, item).await
}

pub async fn save_class_action(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    action: &ClassAction,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::ClassActions, original_name, action).await
}

pub async fn save_condition(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    condition: &Condition,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::Conditions, original_name, condition).await
}

pub async fn save_npc(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    npc: &NpcRecord,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::Npcs, original_name, npc).await
}

pub async fn save_location(
    data_dir: impl AsRef<Path>,
    original_name: &str,
    location: &LocationRecord,
) -> Result<(), PersistError> {
    upsert_record(data_dir, Collection::Locations, original_name, location).await
}

/// Overwrite only the campaign notes of an existing NPC.
pub async fn update_campaign_notes(
    data_dir: impl AsRef<Path>,
    npc_name: &str,
    notes: &str,
) -> Result<(), PersistError> {
    patch_record(data_dir, Collection::Npcs, npc_name, |record| {
        record.insert("campaign_notes".to_string(), Value::String(notes.to_string()));
    })
    .await
}

/// Overwrite the directly assigned NPC names of an existing location.
pub async fn save_location_assignments(
    data_dir: impl AsRef<Path>,
    location_name: &str,
    npc_names: &[String],
) -> Result<(), PersistError> {
    let names: Vec<Value> = npc_names.iter().cloned().map(Value::String).collect();
    patch_record(data_dir, Collection::Locations, location_name, |record| {
        record.remove("npc_ids");
        record.insert("npcs".to_string(), Value::Array(names));
    })
    .await
}
