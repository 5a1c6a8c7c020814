//! Run persistence for save/load.
//!
//! A save is the full [`RunState`] wrapped in a small versioned envelope.
//! The state round-trips losslessly through JSON, so a loaded run replays
//! exactly like the one that was saved.

use crate::score::calculate_score;
use crate::world::RunState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
pub const SAVE_VERSION: u32 = 1;

/// A saved run with everything needed to resume play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRun {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created, in seconds since the Unix epoch.
    pub saved_at: String,

    /// Unique id for this save.
    pub save_id: Uuid,

    /// The complete run state.
    pub state: RunState,

    /// Summary readable without deserializing the state.
    pub metadata: SaveMetadata,
}

/// Metadata about the save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub seed: String,
    pub depth: u32,
    pub party_size: usize,

    /// Level of the first party member.
    pub hero_level: u32,

    pub gold: u32,
    pub score: u64,

    /// Duplicated from the envelope for peek access.
    #[serde(default)]
    pub saved_at: String,
}

impl SaveMetadata {
    fn from_state(state: &RunState, saved_at: &str) -> Self {
        Self {
            seed: state.seed.clone(),
            depth: state.depth,
            party_size: state.party.members.len(),
            hero_level: state.party.members.first().map(|m| m.level).unwrap_or(0),
            gold: state.party.gold,
            score: calculate_score(state),
            saved_at: saved_at.to_string(),
        }
    }
}

impl SavedRun {
    /// Wrap a run state for saving.
    pub fn new(state: RunState) -> Self {
        let saved_at = unix_timestamp();
        let metadata = SaveMetadata::from_state(&state, &saved_at);
        Self {
            version: SAVE_VERSION,
            saved_at,
            save_id: Uuid::new_v4(),
            state,
            metadata,
        }
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        info!(path = %path.display(), depth = self.state.depth, "run saved");
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        debug!(path = %path.display(), save_id = %saved.save_id, "run loaded");
        Ok(saved)
    }

    /// Read a save's metadata without loading the full state.
    pub async fn peek_metadata(path: impl AsRef<Path>) -> Result<SaveMetadata, PersistError> {
        let content = fs::read_to_string(path).await?;

        #[derive(Deserialize)]
        struct Partial {
            version: u32,
            metadata: SaveMetadata,
        }

        let partial: Partial = serde_json::from_str(&content)?;

        if partial.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: partial.version,
            });
        }

        Ok(partial.metadata)
    }
}

/// Information about a save file.
#[derive(Debug, Clone)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub metadata: SaveMetadata,
}

/// List every readable save in a directory, newest first.
///
/// Files that fail to parse or carry another version are skipped.
pub async fn list_saves(dir: impl AsRef<Path>) -> Result<Vec<SaveInfo>, PersistError> {
    let mut saves = Vec::new();
    let mut entries = fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(metadata) = SavedRun::peek_metadata(&path).await {
                saves.push(SaveInfo { path, metadata });
            }
        }
    }

    saves.sort_by(|a, b| {
        b.metadata
            .saved_at
            .cmp(&a.metadata.saved_at)
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(saves)
}

/// Auto-save file for a seed.
pub fn auto_save_path(base_dir: impl AsRef<Path>, seed: &str) -> PathBuf {
    base_dir
        .as_ref()
        .join(format!("{}_autosave.json", sanitize(seed)))
}

/// Manual save file for a seed, stamped with the current time.
pub fn manual_save_path(base_dir: impl AsRef<Path>, seed: &str) -> PathBuf {
    base_dir
        .as_ref()
        .join(format!("{}_{}.json", sanitize(seed), unix_timestamp()))
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "run".to_string()
    } else {
        cleaned
    }
}

/// Seconds since the Unix epoch, zero-padded so saves sort as strings.
fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{:012}", now.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::create_initial_run_state;
    use tempfile::tempdir;

    #[test]
    fn test_metadata_from_state() {
        let mut state = create_initial_run_state("meta");
        state.depth = 3;
        state.party.gold = 42;
        let saved = SavedRun::new(state);
        assert_eq!(saved.version, SAVE_VERSION);
        assert_eq!(saved.metadata.seed, "meta");
        assert_eq!(saved.metadata.depth, 3);
        assert_eq!(saved.metadata.party_size, 1);
        assert_eq!(saved.metadata.hero_level, 1);
        assert_eq!(saved.metadata.gold, 42);
        assert_eq!(saved.metadata.score, 342);
        assert_eq!(saved.metadata.saved_at, saved.saved_at);
    }

    #[test]
    fn test_save_ids_are_unique() {
        let a = SavedRun::new(create_initial_run_state("ids"));
        let b = SavedRun::new(create_initial_run_state("ids"));
        assert_ne!(a.save_id, b.save_id);
    }

    #[test]
    fn test_save_paths_are_sanitized() {
        let path = auto_save_path("/tmp/saves", "my seed/../x");
        assert_eq!(path, PathBuf::from("/tmp/saves/my_seed____x_autosave.json"));
        let empty = auto_save_path("/tmp/saves", "");
        assert_eq!(empty, PathBuf::from("/tmp/saves/run_autosave.json"));
        let manual = manual_save_path("/tmp/saves", "abc");
        assert!(manual.to_string_lossy().starts_with("/tmp/saves/abc_"));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.json");

        let mut state = create_initial_run_state("round-trip");
        state.log("something happened");
        state.mutations.push("Fog".to_string());
        let saved = SavedRun::new(state.clone());
        saved.save_json(&path).await.unwrap();

        let loaded = SavedRun::load_json(&path).await.unwrap();
        assert_eq!(loaded.state, state);
        assert_eq!(loaded.save_id, saved.save_id);
        assert_eq!(loaded.metadata, saved.metadata);
    }

    #[tokio::test]
    async fn test_version_mismatch_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("old.json");

        let mut saved = SavedRun::new(create_initial_run_state("old"));
        saved.version = SAVE_VERSION + 1;
        saved.save_json(&path).await.unwrap();

        let err = SavedRun::load_json(&path).await.unwrap_err();
        assert!(matches!(
            err,
            PersistError::VersionMismatch { expected, found }
                if expected == SAVE_VERSION && found == SAVE_VERSION + 1
        ));
        assert!(SavedRun::peek_metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = SavedRun::load_json(dir.path().join("nope.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[tokio::test]
    async fn test_list_saves_skips_garbage() {
        let dir = tempdir().unwrap();
        SavedRun::new(create_initial_run_state("one"))
            .save_json(auto_save_path(dir.path(), "one"))
            .await
            .unwrap();
        SavedRun::new(create_initial_run_state("two"))
            .save_json(auto_save_path(dir.path(), "two"))
            .await
            .unwrap();
        fs::write(dir.path().join("broken.json"), "{not json")
            .await
            .unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").await.unwrap();

        let saves = list_saves(dir.path()).await.unwrap();
        let mut seeds: Vec<_> = saves.iter().map(|s| s.metadata.seed.clone()).collect();
        seeds.sort();
        assert_eq!(seeds, vec!["one".to_string(), "two".to_string()]);
    }
}
