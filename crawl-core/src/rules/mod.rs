//! Action resolution.
//!
//! Every transition goes through [`RulesEngine::resolve`]:
//! 1. The input state is cloned; the caller's copy is never touched
//! 2. The action is validated against the clone
//! 3. Valid actions draw a generator derived from seed, depth and the
//!    action counter, then mutate the clone
//!
//! Invalid actions leave the clone as it was, or append a single log line.
//! Only malformed content (a broken dice expression, an empty pick) becomes
//! an [`ActionError`].

pub mod combat;
pub mod rest;
pub mod rooms;
pub mod trade;

use crate::dice::{DiceError, DiceExpression, IntSource};
use crate::generator::room_rng;
use crate::hash::hash_with_seed;
use crate::rng::{RngError, SeededRng};
use crate::world::{create_initial_run_state, EquipmentSlot, RoomType, RunState, Skill};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Everything a player can do to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Throw the current run away and start over.
    StartRun { seed: String },
    AdvanceRoom,
    /// Settle the current room with one abstract contest.
    ResolveRoom,
    TakeShortRest { actor_ids: Vec<String> },
    TakeLongRest,
    Attack {
        attacker_id: String,
        target_id: String,
    },
    UseAbility {
        actor_id: String,
        ability_id: String,
        #[serde(default)]
        target_id: Option<String>,
    },
    Escape,
    DisarmTrap,
    TriggerTrap,
    PrayAtShrine,
    DismissPopup,
    BuyItem { item_id: String, cost: u32 },
    SellItem { item_id: String },
    EquipItem {
        actor_id: String,
        item_id: String,
        #[serde(default)]
        slot: Option<EquipmentSlot>,
    },
    UnequipItem {
        actor_id: String,
        slot: EquipmentSlot,
    },
    HireRecruit { recruit_id: String },
    RenameItem { item_id: String, new_name: String },
    SpendStatPoint { actor_id: String, stat: Skill },
    EnterBossRoom,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::StartRun { .. } => "start_run",
            Action::AdvanceRoom => "advance_room",
            Action::ResolveRoom => "resolve_room",
            Action::TakeShortRest { .. } => "take_short_rest",
            Action::TakeLongRest => "take_long_rest",
            Action::Attack { .. } => "attack",
            Action::UseAbility { .. } => "use_ability",
            Action::Escape => "escape",
            Action::DisarmTrap => "disarm_trap",
            Action::TriggerTrap => "trigger_trap",
            Action::PrayAtShrine => "pray_at_shrine",
            Action::DismissPopup => "dismiss_popup",
            Action::BuyItem { .. } => "buy_item",
            Action::SellItem { .. } => "sell_item",
            Action::EquipItem { .. } => "equip_item",
            Action::UnequipItem { .. } => "unequip_item",
            Action::HireRecruit { .. } => "hire_recruit",
            Action::RenameItem { .. } => "rename_item",
            Action::SpendStatPoint { .. } => "spend_stat_point",
            Action::EnterBossRoom => "enter_boss_room",
        }
    }

    /// Actions still accepted once the run is over.
    fn allowed_after_game_over(&self) -> bool {
        matches!(self, Action::StartRun { .. } | Action::DismissPopup)
    }
}

/// Malformed input met while resolving an action.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("dice: {0}")]
    Dice(#[from] DiceError),

    #[error("rng: {0}")]
    Rng(#[from] RngError),
}

// ============================================================================
// Engine
// ============================================================================

/// Resolves actions against a run state.
pub struct RulesEngine;

impl RulesEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve an action, returning the next state.
    pub fn resolve(&self, state: &RunState, action: Action) -> Result<RunState, ActionError> {
        if state.game_over && !action.allowed_after_game_over() {
            debug!(action = action.name(), "ignored after game over");
            return Ok(state.clone());
        }

        let mut next = state.clone();
        match action {
            Action::StartRun { seed } => {
                info!(%seed, "starting run");
                return Ok(create_initial_run_state(seed));
            }
            Action::AdvanceRoom => self.resolve_advance_room(&mut next)?,
            Action::ResolveRoom => self.resolve_room(&mut next)?,
            Action::TakeShortRest { actor_ids } => rest::short_rest(&mut next, &actor_ids),
            Action::TakeLongRest => rest::long_rest(&mut next),
            Action::Attack {
                attacker_id,
                target_id,
            } => self.resolve_attack(&mut next, &attacker_id, &target_id)?,
            Action::UseAbility {
                actor_id,
                ability_id,
                target_id,
            } => self.resolve_use_ability(&mut next, &actor_id, &ability_id, target_id.as_deref())?,
            Action::Escape => self.resolve_escape(&mut next)?,
            Action::DisarmTrap => self.resolve_disarm_trap(&mut next)?,
            Action::TriggerTrap => self.resolve_trigger_trap(&mut next)?,
            Action::PrayAtShrine => self.resolve_pray(&mut next)?,
            Action::DismissPopup => {
                next.victory = false;
                next.shrine_boon = None;
            }
            Action::BuyItem { item_id, cost } => trade::buy_item(&mut next, &item_id, cost),
            Action::SellItem { item_id } => trade::sell_item(&mut next, &item_id),
            Action::EquipItem {
                actor_id,
                item_id,
                slot,
            } => trade::equip_item(&mut next, &actor_id, &item_id, slot),
            Action::UnequipItem { actor_id, slot } => trade::unequip_item(&mut next, &actor_id, slot),
            Action::HireRecruit { recruit_id } => trade::hire_recruit(&mut next, &recruit_id),
            Action::RenameItem { item_id, new_name } => {
                trade::rename_item(&mut next, &item_id, &new_name)
            }
            Action::SpendStatPoint { actor_id, stat } => {
                trade::spend_stat_point(&mut next, &actor_id, stat)
            }
            Action::EnterBossRoom => rooms::enter_boss_room(&mut next),
        }
        Ok(next)
    }

    fn resolve_advance_room(&self, state: &mut RunState) -> Result<(), ActionError> {
        let mut rng = room_rng(&state.seed, state.depth + 1);
        rooms::advance_room(state, &mut rng)
    }

    fn resolve_room(&self, state: &mut RunState) -> Result<(), ActionError> {
        if state.current_room.is_none() {
            return Ok(());
        }
        let key = format!("{}-resolve-{}", state.seed, state.depth);
        let mut rng = SeededRng::new(hash_with_seed(&key, 0));
        rooms::resolve_room(state, &mut rng);
        Ok(())
    }

    fn resolve_attack(
        &self,
        state: &mut RunState,
        attacker_id: &str,
        target_id: &str,
    ) -> Result<(), ActionError> {
        if !combat::can_attack(state, attacker_id, target_id) {
            debug!(attacker_id, target_id, "attack rejected");
            return Ok(());
        }
        let mut rng = action_rng(state, "attack");
        combat::attack(state, attacker_id, target_id, &mut rng)
    }

    fn resolve_use_ability(
        &self,
        state: &mut RunState,
        actor_id: &str,
        ability_id: &str,
        target_id: Option<&str>,
    ) -> Result<(), ActionError> {
        if !combat::can_use_ability(state, actor_id, ability_id, target_id) {
            debug!(actor_id, ability_id, "ability rejected");
            return Ok(());
        }
        let mut rng = action_rng(state, "ability");
        combat::use_ability(state, actor_id, ability_id, target_id, &mut rng)
    }

    fn resolve_escape(&self, state: &mut RunState) -> Result<(), ActionError> {
        if !combat::can_escape(state) {
            return Ok(());
        }
        let mut rng = action_rng(state, "escape");
        combat::escape(state, &mut rng)
    }

    fn resolve_disarm_trap(&self, state: &mut RunState) -> Result<(), ActionError> {
        if !rooms::can_interact(state, RoomType::Hazard) {
            return Ok(());
        }
        let mut rng = action_rng(state, "disarm");
        rooms::disarm_trap(state, &mut rng)
    }

    fn resolve_trigger_trap(&self, state: &mut RunState) -> Result<(), ActionError> {
        if !rooms::can_interact(state, RoomType::Hazard) {
            return Ok(());
        }
        let mut rng = action_rng(state, "trigger");
        rooms::trigger_trap(state, &mut rng)
    }

    fn resolve_pray(&self, state: &mut RunState) -> Result<(), ActionError> {
        if !rooms::can_interact(state, RoomType::Shrine) {
            return Ok(());
        }
        let mut rng = action_rng(state, "pray");
        rooms::pray_at_shrine(state, &mut rng)
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply an action, surfacing malformed input as an error.
pub fn try_apply_action(state: &RunState, action: Action) -> Result<RunState, ActionError> {
    RulesEngine::new().resolve(state, action)
}

/// Apply an action. Never fails: malformed input leaves the state as it
/// was, plus a log line.
pub fn apply_action(state: &RunState, action: Action) -> RunState {
    let name = action.name();
    match try_apply_action(state, action) {
        Ok(next) => next,
        Err(err) => {
            warn!(action = name, error = %err, "action failed");
            let mut next = state.clone();
            next.log(format!("Action failed: {err}"));
            next
        }
    }
}

/// The generator for the next randomness-consuming action.
///
/// Derived from seed, a per-action label, depth and the action counter,
/// which it advances.
pub(crate) fn action_rng(state: &mut RunState, label: &str) -> SeededRng {
    let key = format!("{}-{}-{}", state.seed, label, state.depth);
    let rng = SeededRng::new(hash_with_seed(&key, state.rng_tick as i32));
    state.rng_tick = state.rng_tick.wrapping_add(1);
    rng
}

/// A single d20.
pub(crate) fn d20<S: IntSource + ?Sized>(source: &mut S) -> i32 {
    DiceExpression::new(1, 20, 0).roll_with(source).total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_state_is_never_mutated() {
        let state = create_initial_run_state("immutable");
        let before = state.clone();
        let next = apply_action(&state, Action::PrayAtShrine);
        assert_eq!(state, before);
        assert_ne!(next, before);
    }

    #[test]
    fn test_start_run_resets() {
        let mut state = create_initial_run_state("old");
        state.depth = 7;
        state.game_over = true;
        let next = apply_action(&state, Action::StartRun { seed: "new".to_string() });
        assert_eq!(next.seed, "new");
        assert_eq!(next.depth, 0);
        assert!(!next.game_over);
    }

    #[test]
    fn test_game_over_blocks_actions() {
        let mut state = create_initial_run_state("over");
        state.game_over = true;
        let next = apply_action(&state, Action::AdvanceRoom);
        assert_eq!(next, state);
    }

    #[test]
    fn test_dismiss_popup() {
        let mut state = create_initial_run_state("popup");
        state.victory = true;
        state.shrine_boon = Some("boon".to_string());
        let next = apply_action(&state, Action::DismissPopup);
        assert!(!next.victory);
        assert!(next.shrine_boon.is_none());
    }

    #[test]
    fn test_invalid_action_is_noop() {
        let state = create_initial_run_state("noop");
        let next = apply_action(
            &state,
            Action::Attack {
                attacker_id: "hero-1".to_string(),
                target_id: "nobody".to_string(),
            },
        );
        assert_eq!(next, state);
    }

    #[test]
    fn test_action_rng_advances_tick() {
        let mut state = create_initial_run_state("tick");
        let mut first = action_rng(&mut state, "attack");
        let mut second = action_rng(&mut state, "attack");
        assert_eq!(state.rng_tick, 2);
        assert_ne!(first.next_value(), second.next_value());
    }

    #[test]
    fn test_advance_then_pray_rejected_outside_shrine() {
        let state = create_initial_run_state("adv");
        let next = apply_action(&state, Action::AdvanceRoom);
        assert_eq!(next.depth, 1);
        if next.room_type() != Some(RoomType::Shrine) {
            let prayed = apply_action(&next, Action::PrayAtShrine);
            assert_eq!(prayed, next);
        }
    }

    #[test]
    fn test_action_serde_tag() {
        let action = Action::BuyItem {
            item_id: "ring_common".to_string(),
            cost: 30,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"buy_item\""));
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
