//! RunSession - the primary public API for driving a run.
//!
//! Wraps the pure state machine with the things a frontend needs around it:
//! a current state, per-action responses, scoring, and save files.

use crate::persist::{auto_save_path, PersistError, SavedRun};
use crate::rules::{apply_action, Action};
use crate::score::calculate_score;
use crate::world::{create_initial_run_state, CombatTurn, RunState};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from RunSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("No seed configured - pass one or set CRAWL_SEED")]
    NoSeed,

    #[error("No save directory configured")]
    NoSaveDir,

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Configuration for creating a new run session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Seed for the run. Required to start one.
    pub seed: Option<String>,

    /// Where saves and auto-saves go.
    pub save_dir: Option<PathBuf>,

    /// Save after every action. Needs a save directory.
    pub autosave: bool,
}

impl SessionConfig {
    /// Create a config for the given seed.
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: Some(seed.into()),
            ..Self::default()
        }
    }

    /// Read `CRAWL_SEED`, `CRAWL_SAVE_DIR` and `CRAWL_AUTOSAVE`.
    pub fn from_env() -> Result<Self, SessionError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SessionError> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let autosave = match non_empty("CRAWL_AUTOSAVE") {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(SessionError::InvalidEnv {
                        var: "CRAWL_AUTOSAVE",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            seed: non_empty("CRAWL_SEED"),
            save_dir: non_empty("CRAWL_SAVE_DIR").map(PathBuf::from),
            autosave,
        })
    }

    /// Set the seed.
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Set the save directory.
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    /// Turn auto-saving on or off.
    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }
}

/// What changed after one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// History lines the action added, oldest first.
    pub new_lines: Vec<String>,

    /// Whether combat is currently active.
    pub in_combat: bool,

    /// Whether the party may act.
    pub is_player_turn: bool,

    pub game_over: bool,
}

/// A single run in progress.
pub struct RunSession {
    state: RunState,
    config: SessionConfig,
}

impl RunSession {
    /// Start a fresh run from the configured seed.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        let seed = config.seed.clone().ok_or(SessionError::NoSeed)?;
        Ok(Self {
            state: create_initial_run_state(seed),
            config,
        })
    }

    /// Resume from an existing state.
    pub fn with_state(state: RunState, config: SessionConfig) -> Self {
        Self { state, config }
    }

    /// Load a saved run from a file.
    pub async fn load(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self, SessionError> {
        let saved = SavedRun::load_json(path).await?;
        Ok(Self::with_state(saved.state, config))
    }

    /// Save the current run to a file.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        SavedRun::new(self.state.clone()).save_json(path).await?;
        Ok(())
    }

    /// Save to the auto-save file for this seed.
    pub async fn auto_save(&self) -> Result<PathBuf, SessionError> {
        let dir = self.config.save_dir.as_ref().ok_or(SessionError::NoSaveDir)?;
        let path = auto_save_path(dir, &self.state.seed);
        self.save(&path).await?;
        Ok(path)
    }

    /// Apply one action and report what it did.
    ///
    /// The transition is committed before any auto-save, and a failed
    /// auto-save never rolls it back.
    pub async fn apply(&mut self, action: Action) -> Response {
        debug!(action = action.name(), depth = self.state.depth, "session apply");
        let next = apply_action(&self.state, action);
        let new_lines = added_lines(&self.state.history, &next.history);
        self.state = next;

        if self.config.autosave {
            if let Err(err) = self.auto_save().await {
                warn!(error = %err, "auto-save failed");
            }
        }

        Response {
            new_lines,
            in_combat: self.in_combat(),
            is_player_turn: self.is_player_turn(),
            game_over: self.state.game_over,
        }
    }

    /// Get a reference to the run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn score(&self) -> u64 {
        calculate_score(&self.state)
    }

    pub fn in_combat(&self) -> bool {
        self.state.in_combat()
    }

    pub fn is_player_turn(&self) -> bool {
        self.state.combat_turn == CombatTurn::Player
    }
}

/// Lines in `after` that were not in `before`.
///
/// History is capped, so old lines may have dropped off the front. The new
/// lines are whatever follows the longest suffix of `before` that `after`
/// starts with.
fn added_lines(before: &[String], after: &[String]) -> Vec<String> {
    for start in 0..=before.len() {
        let kept = &before[start..];
        if after.starts_with(kept) {
            return after[kept.len()..].to_vec();
        }
    }
    after.to_vec()
}
