//! Deterministic dungeon-crawl simulation engine.
//!
//! This crate provides:
//! - A seeded, replayable run state machine (rooms, combat, rests, trade)
//! - Dice notation and a seedable random source
//! - Itemization with tiered, stackable enchantments
//! - Scoring and JSON save files
//!
//! Every transition is a pure `(&RunState, Action) -> RunState`. The same
//! seed and the same actions always give the same run.
//!
//! # Quick Start
//!
//! ```ignore
//! use crawl_core::{Action, RunSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("my-seed").with_save_dir("saves");
//!     let mut session = RunSession::new(config)?;
//!
//!     let response = session.apply(Action::PrayAtShrine).await;
//!     for line in &response.new_lines {
//!         println!("{line}");
//!     }
//!
//!     session.apply(Action::AdvanceRoom).await;
//!     println!("score: {}", session.score());
//!     session.save("saves/my-seed.json").await?;
//!     Ok(())
//! }
//! ```

pub mod content;
pub mod dice;
pub mod enchant;
pub mod generator;
pub mod hash;
pub mod items;
pub mod persist;
pub mod rng;
pub mod rules;
pub mod score;
pub mod session;
pub mod testing;
pub mod world;

// Primary public API
pub use dice::{roll, DiceError, DiceExpression, RollResult};
pub use generator::{calculate_escape_dc, generate_room, get_difficulty};
pub use persist::{PersistError, SavedRun};
pub use rng::{RandomSource, RngError, SeededRng};
pub use rules::{apply_action, try_apply_action, Action, ActionError, RulesEngine};
pub use score::calculate_score;
pub use session::{Response, RunSession, SessionConfig, SessionError};
pub use testing::{ScriptedRolls, TestHarness};
pub use world::{create_initial_run_state, RunState};
