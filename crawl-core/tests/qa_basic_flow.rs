//! QA tests for basic run flow through the public API.
//!
//! These drive whole runs with `apply_action` and check the properties that
//! must hold no matter what the dice do.

use crawl_core::world::{EquipmentSlot, RoomType, RunState};
use crawl_core::{apply_action, create_initial_run_state, generate_room, Action};

/// A run whose hero cannot realistically die.
fn sturdy_run(seed: &str) -> RunState {
    let mut state = create_initial_run_state(seed);
    let hero = &mut state.party.members[0];
    hero.hp.max = 10_000;
    hero.hp.current = 10_000;
    state
}

// =============================================================================
// STARTING SHRINE
// =============================================================================

#[test]
fn test_starting_shrine_blesses_main_hand() {
    let state = create_initial_run_state("t1");
    assert_eq!(state.depth, 0);
    assert_eq!(
        state.current_room.as_ref().map(|r| r.room_type),
        Some(RoomType::Shrine)
    );

    let next = apply_action(&state, Action::PrayAtShrine);
    assert!(next.room_resolved);
    let weapon = next.party.members[0]
        .equipment
        .get(&EquipmentSlot::MainHand)
        .expect("hero keeps a weapon");
    assert!(weapon.enchantment.is_some());
    assert!(next.shrine_boon.is_some());

    // The caller's state is untouched.
    assert!(!state.room_resolved);
    assert!(state.party.members[0]
        .equipment
        .get(&EquipmentSlot::MainHand)
        .is_some_and(|w| w.enchantment.is_none()));
}

#[test]
fn test_dismiss_popup_clears_boon() {
    let state = apply_action(&create_initial_run_state("t1"), Action::PrayAtShrine);
    let next = apply_action(&state, Action::DismissPopup);
    assert!(next.shrine_boon.is_none());
    assert!(!next.victory);
}

// =============================================================================
// ADVANCING
// =============================================================================

#[test]
fn test_advance_increments_depth_by_one() {
    let mut state = sturdy_run("monotonic");
    for expected in 1..=5 {
        state = apply_action(&state, Action::AdvanceRoom);
        assert_eq!(state.depth, expected);
        assert_eq!(
            state.current_room.as_ref().map(|r| r.id.clone()),
            Some(format!("room-{expected}"))
        );
    }
}

#[test]
fn test_intermission_at_depth_ten_with_segment_rest() {
    let mut state = sturdy_run("segment");
    for _ in 0..9 {
        state = apply_action(&state, Action::AdvanceRoom);
    }
    assert_eq!(state.depth, 9);
    state.short_rests_remaining = 0;

    state = apply_action(&state, Action::AdvanceRoom);
    assert_eq!(state.depth, 10);
    let room = state.current_room.as_ref().expect("room at depth 10");
    assert_eq!(room.room_type, RoomType::Intermission);
    assert!(!room.shop_items.is_empty());
    assert!(!state.in_combat());
    assert_eq!(state.short_rests_remaining, 2);
    assert_eq!(state.long_rests_taken, 1);
    assert!(state.history.iter().any(|l| l == "Party took a Long Rest. Theme changed."));
}

#[test]
fn test_every_tenth_depth_is_intermission() {
    for depth in [10, 20, 30, 40, 90] {
        let mut state = create_initial_run_state("cadence");
        state.depth = depth;
        assert_eq!(generate_room(&state).room_type, RoomType::Intermission);
    }
}

#[test]
fn test_thirty_step_simulation_keeps_resources_sane() {
    for seed in ["sim-a", "sim-b", "sim-c", "sim-d"] {
        let mut state = create_initial_run_state(seed);
        let mut last_depth = state.depth;

        for step in 0..30 {
            let action = if step % 2 == 0 {
                Action::AdvanceRoom
            } else {
                Action::ResolveRoom
            };
            state = apply_action(&state, action);

            assert!(state.depth >= last_depth, "depth went backwards on {seed}");
            last_depth = state.depth;
            for member in &state.party.members {
                assert!(member.hp.current >= 0, "negative HP on {seed}");
                assert!(member.hp.current <= member.hp.max);
            }
            assert!(state.short_rests_remaining <= 2);
            assert!(state.history.len() <= 100);
        }
    }
}

#[test]
fn test_resolve_room_settles_the_room_in_place() {
    for n in 0..20 {
        let seed = format!("deep{n}");
        for depth in 2..12 {
            let mut state = create_initial_run_state(&seed);
            state.depth = depth;
            let room = generate_room(&state);
            state.current_room = Some(room.clone());
            state.room_resolved = false;
            let hp: Vec<i32> = state.party.members.iter().map(|m| m.hp.current).collect();

            let next = apply_action(&state, Action::ResolveRoom);
            let after = next.current_room.as_ref().expect("room kept");

            assert_eq!(after.id, room.id, "{seed} depth {depth}");
            assert_eq!(after.room_type, room.room_type, "{seed} depth {depth}");
            assert_eq!(after.loot, room.loot);
            assert_eq!(after.shop_items, room.shop_items);
            assert!(next.room_resolved);

            if matches!(room.room_type, RoomType::Combat | RoomType::Elite) {
                assert!(after.enemies.is_empty());
            } else {
                assert_eq!(after.enemies, room.enemies);
                let hp_after: Vec<i32> = next.party.members.iter().map(|m| m.hp.current).collect();
                assert_eq!(hp_after, hp, "{seed} depth {depth}: no fight, no damage");
            }
        }
    }
}

#[test]
fn test_game_over_blocks_advancing() {
    let mut state = create_initial_run_state("doom");
    state.game_over = true;
    let next = apply_action(&state, Action::AdvanceRoom);
    assert_eq!(next, state);

    let restarted = apply_action(&state, Action::StartRun { seed: "again".into() });
    assert!(!restarted.game_over);
    assert_eq!(restarted.seed, "again");
    assert_eq!(restarted.depth, 0);
}

// =============================================================================
// TRADE
// =============================================================================

#[test]
fn test_buy_then_equip_swaps_old_weapon_into_inventory() {
    let mut state = create_initial_run_state("shopping");
    state.party.gold = 50;

    state = apply_action(
        &state,
        Action::BuyItem {
            item_id: "fighter_sword_common".into(),
            cost: 15,
        },
    );
    assert_eq!(state.party.gold, 35);
    let bought = state.inventory.items.last().expect("bought item").clone();
    assert_eq!(bought.name, "Iron Sword");

    state = apply_action(
        &state,
        Action::EquipItem {
            actor_id: "hero-1".into(),
            item_id: bought.id.clone(),
            slot: None,
        },
    );
    let hero = &state.party.members[0];
    assert_eq!(
        hero.equipment.get(&EquipmentSlot::MainHand).map(|i| i.id.as_str()),
        Some(bought.id.as_str())
    );
    assert!(state.inventory.items.iter().any(|i| i.name == "Rusty Sword"));
    assert!(!state.inventory.items.iter().any(|i| i.id == bought.id));
}

#[test]
fn test_buying_without_gold_only_logs() {
    let state = create_initial_run_state("broke");
    let next = apply_action(
        &state,
        Action::BuyItem {
            item_id: "ring_uncommon".into(),
            cost: 40,
        },
    );
    assert_eq!(next.party.gold, 0);
    assert!(next.inventory.items.is_empty());
    assert_eq!(
        next.history.last().map(String::as_str),
        Some("Not enough gold to buy item.")
    );
}

#[test]
fn test_short_rest_on_damaged_fighter() {
    let mut state = create_initial_run_state("rest");
    state.party.members[0].hp.current = 5;
    let next = apply_action(
        &state,
        Action::TakeShortRest {
            actor_ids: vec!["hero-1".into()],
        },
    );
    assert_eq!(next.party.members[0].hp.current, 11);
    assert_eq!(next.short_rests_remaining, 1);
}
