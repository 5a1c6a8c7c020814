//! Testing utilities for the crawl engine.
//!
//! This module provides tools for deterministic tests:
//! - `ScriptedRolls` to force exact dice faces and float draws
//! - `TestHarness` for scripted run scenarios
//! - Assertion helpers for verifying run state

use crate::dice::IntSource;
use crate::rng::RandomSource;
use crate::rules::{apply_action, Action};
use crate::world::{create_initial_run_state, Actor, CombatTurn, Enemy, Room, RoomType, RunState};
use std::collections::VecDeque;

/// A random source that replays scripted values.
///
/// Integers are clamped into the requested range. When a queue runs dry,
/// `int` returns the lower bound and `float` returns `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    ints: VecDeque<i32>,
    floats: VecDeque<f64>,
}

impl ScriptedRolls {
    pub fn new(ints: impl IntoIterator<Item = i32>) -> Self {
        Self {
            ints: ints.into_iter().collect(),
            floats: VecDeque::new(),
        }
    }

    pub fn with_floats(mut self, floats: impl IntoIterator<Item = f64>) -> Self {
        self.floats = floats.into_iter().collect();
        self
    }

    /// Integers not yet consumed.
    pub fn remaining_ints(&self) -> usize {
        self.ints.len()
    }
}

impl IntSource for ScriptedRolls {
    fn int(&mut self, min: i32, max: i32) -> i32 {
        let (lo, hi) = if min > max { (max, min) } else { (min, max) };
        match self.ints.pop_front() {
            Some(value) => value.clamp(lo, hi),
            None => lo,
        }
    }
}

impl RandomSource for ScriptedRolls {
    fn float(&mut self) -> f64 {
        self.floats.pop_front().unwrap_or(0.0)
    }
}

/// Build an enemy with fixed stats.
pub fn test_enemy(id: &str, hp: i32, ac: i32, power: i32) -> Enemy {
    Enemy {
        id: id.to_string(),
        name: id.to_string(),
        hp,
        max_hp: hp,
        power,
        damage: "1d4".to_string(),
        ac,
        xp: power * 10,
        tags: Vec::new(),
        turned_rounds: 0,
    }
}

/// Test harness for running scripted scenarios.
pub struct TestHarness {
    pub state: RunState,
}

impl TestHarness {
    /// A fresh run for the given seed.
    pub fn new(seed: &str) -> Self {
        Self {
            state: create_initial_run_state(seed),
        }
    }

    /// Replace the current room with a fight against these enemies, player
    /// to act first.
    pub fn with_fight(mut self, room_type: RoomType, enemies: Vec<Enemy>) -> Self {
        let mut room = Room::new(
            format!("room-{}", self.state.depth),
            room_type,
            self.state.theme_id.clone(),
        );
        room.enemies = enemies;
        self.state.current_room = Some(room);
        self.state.room_resolved = false;
        self.state.combat_turn = CombatTurn::Player;
        self.state.combat_round = 1;
        self.state.acted_this_round.clear();
        self
    }

    /// Move to a depth without generating anything.
    pub fn at_depth(mut self, depth: u32) -> Self {
        self.state.depth = depth;
        self
    }

    pub fn with_gold(mut self, gold: u32) -> Self {
        self.state.party.gold = gold;
        self
    }

    /// Apply an action through the public entry point.
    pub fn apply(&mut self, action: Action) -> &mut Self {
        self.state = apply_action(&self.state, action);
        self
    }

    pub fn hero(&self) -> &Actor {
        &self.state.party.members[0]
    }

    pub fn hero_mut(&mut self) -> &mut Actor {
        &mut self.state.party.members[0]
    }

    /// Hero HP as (current, max).
    pub fn hero_hp(&self) -> (i32, i32) {
        let hp = self.hero().hp;
        (hp.current, hp.max)
    }

    pub fn in_combat(&self) -> bool {
        self.state.in_combat()
    }

    pub fn last_log(&self) -> Option<&str> {
        self.state.history.last().map(String::as_str)
    }

    /// Whether any log line contains the fragment.
    pub fn logged(&self, fragment: &str) -> bool {
        self.state.history.iter().any(|l| l.contains(fragment))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new("test")
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert hero HP is at expected values.
#[track_caller]
pub fn assert_hero_hp(harness: &TestHarness, current: i32, max: i32) {
    let (actual_current, actual_max) = harness.hero_hp();
    assert_eq!(
        (actual_current, actual_max),
        (current, max),
        "Expected HP {current}/{max}, got {actual_current}/{actual_max}"
    );
}

/// Assert the run is in combat.
#[track_caller]
pub fn assert_in_combat(harness: &TestHarness) {
    assert!(harness.in_combat(), "Expected to be in combat");
}

/// Assert the run is NOT in combat.
#[track_caller]
pub fn assert_not_in_combat(harness: &TestHarness) {
    assert!(!harness.in_combat(), "Expected to NOT be in combat");
}

/// Assert some log line contains the fragment.
#[track_caller]
pub fn assert_logged(harness: &TestHarness, fragment: &str) {
    assert!(
        harness.logged(fragment),
        "Expected a log line containing '{fragment}', history: {:#?}",
        harness.state.history
    );
}
