//! Campaign configuration and media layout.
//!
//! A campaign is a data directory of JSON collections plus a media directory
//! of generated portraits, icons and audio. Media files are found by slug:
//! `"Fire Bolt"` lives at `Spells/fire_bolt.png`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = "config.json";

/// Overrides the configured data directory.
pub const DATA_DIR_ENV: &str = "CAMPAIGN_DATA_DIR";

/// Overrides the configured media directory.
pub const MEDIA_DIR_ENV: &str = "CAMPAIGN_MEDIA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a campaign keeps its data and media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("Data")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("Media")
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            media_dir: default_media_dir(),
        }
    }
}

impl CampaignConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_media_dir(mut self, media_dir: impl Into<PathBuf>) -> Self {
        self.media_dir = media_dir.into();
        self
    }

    /// Read a configuration file. A missing file gives the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Apply `CAMPAIGN_DATA_DIR` and `CAMPAIGN_MEDIA_DIR` if they are set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var(MEDIA_DIR_ENV) {
            if !dir.is_empty() {
                self.media_dir = PathBuf::from(dir);
            }
        }
        self
    }

    pub fn media(&self) -> MediaLayout {
        MediaLayout::new(&self.media_dir)
    }
}

// ============================================================================
// Media
// ============================================================================

/// The media sub-folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Npcs,
    Spells,
    Items,
    Abilities,
    MonsterManual,
    Audio,
    ImageReferences,
}

impl MediaKind {
    pub fn folder(&self) -> &'static str {
        match self {
            MediaKind::Npcs => "NPCs",
            MediaKind::Spells => "Spells",
            MediaKind::Items => "Items",
            MediaKind::Abilities => "Abilities",
            MediaKind::MonsterManual => "MonsterManual",
            MediaKind::Audio => "Audio",
            MediaKind::ImageReferences => "Image References",
        }
    }

    pub fn all() -> &'static [MediaKind] {
        &[
            MediaKind::Npcs,
            MediaKind::Spells,
            MediaKind::Items,
            MediaKind::Abilities,
            MediaKind::MonsterManual,
            MediaKind::Audio,
            MediaKind::ImageReferences,
        ]
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.folder())
    }
}

/// File-name stem for an entity: lowercase with spaces as underscores.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Resolves media paths under a media root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaLayout {
    root: PathBuf,
}

impl MediaLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.folder())
    }

    /// Scanned Monster Manual pages, stored under the monster's own name.
    pub fn monster_manual_dir(&self) -> PathBuf {
        self.dir(MediaKind::MonsterManual)
    }

    pub fn portrait_for(&self, npc_name: &str) -> PathBuf {
        self.icon_for(MediaKind::Npcs, npc_name)
    }

    pub fn icon_for(&self, kind: MediaKind, name: &str) -> PathBuf {
        self.dir(kind).join(format!("{}.png", slugify(name)))
    }

    /// The icon path if the file exists.
    pub async fn existing_image_for(&self, kind: MediaKind, name: &str) -> Option<PathBuf> {
        let path = self.icon_for(kind, name);
        match fs::try_exists(&path).await {
            Ok(true) => Some(path),
            _ => None,
        }
    }

    /// Create every media sub-folder.
    pub async fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for kind in MediaKind::all() {
            fs::create_dir_all(self.dir(*kind)).await?;
        }
        Ok(())
    }
}
