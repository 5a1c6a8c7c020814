//! Moving between rooms and resolving the ones without a fight.

use super::combat::{enemy_turn, roll_initiative};
use super::rest::segment_long_rest;
use super::{d20, ActionError};
use crate::dice::roll;
use crate::enchant::bless_equipped;
use crate::generator::generate_room_with;
use crate::rng::RandomSource;
use crate::world::{
    CombatTurn, EquipmentSlot, Role, Room, RoomType, RunState, SHORT_RESTS_PER_SEGMENT,
};
use tracing::{debug, info};

/// Disarm target number.
pub const DISARM_DC: i32 = 12;

/// Heal multiplier at a shrine when a cleric is in the party.
const CLERIC_HEAL_BONUS: f64 = 1.5;

/// Put the party in a freshly generated room at the current depth.
///
/// Fights start on the player's turn; callers roll initiative when the
/// enemies may go first.
pub(crate) fn enter_room(state: &mut RunState, room: Room) {
    let fight = room.is_combat() && room.has_living_enemies();
    state.room_resolved = !matches!(
        room.room_type,
        RoomType::Combat | RoomType::Elite | RoomType::Hazard | RoomType::Shrine | RoomType::Trader
    );
    state.combat_turn = if fight { CombatTurn::Player } else { CombatTurn::None };
    state.combat_round = if fight { 1 } else { 0 };
    state.acted_this_round.clear();
    state.extra_actions = 0;
    state.victory = false;
    state.log(format!(
        "Entered room {}: {}",
        state.depth,
        room.room_type.name().to_uppercase()
    ));
    state.current_room = Some(room);
}

/// Walk one room deeper.
pub fn advance_room<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    state.depth += 1;

    let fallen: Vec<String> = state
        .party
        .members
        .iter()
        .filter(|m| !m.is_alive)
        .map(|m| m.name.clone())
        .collect();
    if !fallen.is_empty() {
        state.party.members.retain(|m| m.is_alive);
        state.log(format!("☠️ {} left behind forever...", fallen.join(", ")));
    }

    let room = generate_room_with(state, rng);
    let fight = room.is_combat() && room.has_living_enemies();
    if fight {
        for member in &mut state.party.members {
            if let Some(weapon) = member.equipment.get_mut(&EquipmentSlot::MainHand) {
                weapon.stats.encounters_used += 1;
            }
        }
    }

    state.in_boss_room = false;
    state.parent_intermission = None;
    let room_type = room.room_type;
    enter_room(state, room);
    info!(depth = state.depth, room_type = %room_type, "advanced");

    if state.depth % 10 == 0 {
        segment_long_rest(state, rng)?;
    }

    if fight {
        let first = roll_initiative(state, rng);
        state.log("━━━ ROUND 1 ━━━");
        if first == CombatTurn::Enemy {
            enemy_turn(state, rng)?;
        }
    }
    Ok(())
}

/// Settle the current room in one abstract contest.
///
/// The room itself is left as it stands apart from its enemies; `rng` only
/// feeds the contest and the damage and stress bands.
pub fn resolve_room<R: RandomSource>(state: &mut RunState, rng: &mut R) {
    let Some(room) = state.current_room.as_ref() else {
        return;
    };
    let room_type = room.room_type;
    let enemy_power: i32 = room.living_enemies().map(|e| e.power).sum();

    if matches!(room_type, RoomType::Combat | RoomType::Elite) {
        let party_power = 2 + 2 * state.party.living().count() as i32;
        let margin = (rng.int(1, 20) + party_power) - (rng.int(1, 20) + enemy_power);

        let (damage, stress) = if margin >= 10 {
            (0, 0)
        } else if margin >= 5 {
            (rng.int(0, 2), rng.int(0, 1))
        } else if margin >= 0 {
            (rng.int(1, 4), rng.int(1, 3))
        } else {
            let extra = margin.abs() / 2;
            (rng.int(2, 6) + extra, rng.int(2, 5) + extra)
        };

        let mut remaining = damage;
        for member in state.party.members.iter_mut().filter(|m| m.is_alive) {
            if remaining <= 0 {
                break;
            }
            let taken = remaining.min(member.hp.current);
            member.take_damage(taken);
            member.stress.current = (member.stress.current + stress).min(member.stress.max);
            remaining -= taken;
        }

        if let Some(room) = state.current_room.as_mut() {
            room.enemies.clear();
        }
        state.log(format!("Combat resolved: Took {damage} damage, {stress} stress."));
        if damage == 0 {
            state.log("Flawless victory!");
        }
        debug!(margin, damage, stress, "room resolved");
    } else {
        state.log(format!("Resolved {room_type} room safely."));
    }

    state.room_resolved = true;
    state.combat_turn = CombatTurn::None;
    state.acted_this_round.clear();

    if state.party.living().next().is_none() {
        state.log("The entire party has fallen! Game Over.");
        state.game_over = true;
    }
}

// ============================================================================
// Hazards
// ============================================================================

/// Shrine and hazard actions need the right room, no enemies, and a room
/// that has not been used yet.
pub fn can_interact(state: &RunState, room_type: RoomType) -> bool {
    state.room_type() == Some(room_type) && !state.room_has_living_enemies() && !state.room_resolved
}

pub fn disarm_trap<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let has_rogue = state.party.has_living(Role::Rogue);
    let rogue_bonus = if has_rogue { 5 } else { 0 };
    let natural = d20(rng);
    let total = natural + 2 + rogue_bonus;

    if total >= DISARM_DC {
        let gold = (5.0 + rng.float() * 11.0).floor() as u32;
        state.party.gold += gold;
        let bonus = if has_rogue { " (Rogue +5 bonus!)" } else { "" };
        state.log(format!(
            "Trap disarmed! (Rolled {natural}+{}={total} vs DC {DISARM_DC}){bonus}. +{gold} gold.",
            2 + rogue_bonus
        ));
        collect_loot(state);
        state.victory = true;
    } else {
        let damage = roll("1d6", rng)?.total;
        state.log(format!("Failed to disarm! (Rolled {total}). Trap deals {damage} damage!"));
        trap_damage(state, damage);
    }

    state.room_resolved = true;
    Ok(())
}

pub fn trigger_trap<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let damage = roll("2d6", rng)?.total;
    state.log(format!("Triggered the trap! Takes {damage} damage!"));
    trap_damage(state, damage);
    if !state.game_over {
        collect_loot(state);
    }
    state.room_resolved = true;
    Ok(())
}

/// Traps hit whoever walks in front.
fn trap_damage(state: &mut RunState, damage: i32) {
    let Some(member) = state.party.members.iter_mut().find(|m| m.is_alive) else {
        return;
    };
    if member.take_damage(damage) {
        state.log("Hero has fallen! Game Over.");
        state.game_over = true;
        state.combat_turn = CombatTurn::None;
        info!(depth = state.depth, "killed by a trap");
    }
}

fn collect_loot(state: &mut RunState) {
    let loot = state
        .current_room
        .as_mut()
        .map(|r| std::mem::take(&mut r.loot))
        .unwrap_or_default();
    if loot.is_empty() {
        return;
    }
    let minted: Vec<_> = loot.iter().map(|t| state.mint_item(t)).collect();
    let names: Vec<&str> = minted.iter().map(|i| i.display_name()).collect();
    state.log(format!("🎁 Found {}!", names.join(", ")));
    state.inventory.items.extend(minted);
}

// ============================================================================
// Shrines
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boon {
    Heal,
    Rest,
    Gold,
    FullHeal,
    Enchant,
}

pub fn pray_at_shrine<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let hero = state.party.members.iter().position(|m| m.is_alive);

    let message = if state.depth == 0 {
        starting_blessing(state, hero, rng)
    } else {
        let damaged = hero.is_some_and(|i| state.party.members[i].hp.is_damaged());
        let equipped = equipped_slots(state);

        let mut pool = Vec::new();
        if damaged {
            pool.push(Boon::Heal);
        }
        if state.short_rests_remaining < SHORT_RESTS_PER_SEGMENT {
            pool.push(Boon::Rest);
        }
        pool.push(Boon::Gold);
        if damaged {
            pool.push(Boon::FullHeal);
        }
        if !equipped.is_empty() {
            pool.push(Boon::Enchant);
        }

        match *rng.pick(&pool)? {
            Boon::Heal => {
                let cleric = state.party.has_living(Role::Cleric);
                let multiplier = if cleric { CLERIC_HEAL_BONUS } else { 1.0 };
                let healed = hero.map_or(0, |i| {
                    let hp = &mut state.party.members[i].hp;
                    let amount = ((hp.max / 2) as f64 * multiplier).floor() as i32;
                    hp.restore(amount)
                });
                let note = if cleric { " (Cleric +50%)" } else { "" };
                format!("The shrine glows warmly. Healed for {healed} HP!{note}")
            }
            Boon::Rest => {
                state.short_rests_remaining += 1;
                "The shrine restores your vitality. +1 Short Rest!".to_string()
            }
            Boon::Gold => gold_boon(state, rng),
            Boon::FullHeal => {
                if let Some(i) = hero {
                    let hp = &mut state.party.members[i].hp;
                    hp.current = hp.max;
                }
                "Divine energy surges through you. Fully healed!".to_string()
            }
            Boon::Enchant => {
                let (index, slot) = *rng.pick(&equipped)?;
                let member = &mut state.party.members[index];
                match bless_equipped(member, slot, rng) {
                    Some(outcome) => format!(
                        "✨ {} Boon{}! {}'s {} becomes {}! (+{} power)",
                        outcome.tier_name,
                        if outcome.upgraded { " (UPGRADED!)" } else { "" },
                        member.name,
                        outcome.old_name,
                        outcome.new_name,
                        outcome.bonus
                    ),
                    None => gold_boon(state, rng),
                }
            }
        }
    };

    state.log(message.clone());
    state.shrine_boon = Some(message);
    state.room_resolved = true;
    info!(depth = state.depth, "prayed at shrine");
    Ok(())
}

/// The first shrine always blesses the hero's weapon.
fn starting_blessing<R: RandomSource>(state: &mut RunState, hero: Option<usize>, rng: &mut R) -> String {
    let blessed = hero.and_then(|i| {
        let member = &mut state.party.members[i];
        let outcome = bless_equipped(member, EquipmentSlot::MainHand, rng)?;
        if let Some(entry) = member
            .equipment
            .get_mut(&EquipmentSlot::MainHand)
            .and_then(|w| w.history.last_mut())
        {
            entry.push_str(" at starting shrine");
        }
        Some(outcome)
    });

    match blessed {
        Some(outcome) => format!(
            "⚔️ {} Weapon Blessing{}! Your {} becomes {}! (+{} power)",
            outcome.tier_name,
            if outcome.upgraded { " (UPGRADED!)" } else { "" },
            outcome.old_name,
            outcome.new_name,
            outcome.bonus
        ),
        None => gold_boon(state, rng),
    }
}

fn gold_boon<R: RandomSource>(state: &mut RunState, rng: &mut R) -> String {
    let gold = rng.int(15, 30) as u32;
    state.party.gold += gold;
    format!("Golden light showers upon you. +{gold} gold!")
}

/// Every (member, slot) pair holding an item, living members only.
fn equipped_slots(state: &RunState) -> Vec<(usize, EquipmentSlot)> {
    state
        .party
        .members
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_alive)
        .flat_map(|(i, m)| m.equipment.keys().map(move |slot| (i, *slot)))
        .collect()
}

// ============================================================================
// Boss chamber
// ============================================================================

/// Step from an intermission into its boss chamber.
pub fn enter_boss_room(state: &mut RunState) {
    if state.in_boss_room || state.in_combat() {
        return;
    }
    let Some(boss) = state
        .current_room
        .as_ref()
        .filter(|r| r.room_type == RoomType::Intermission)
        .and_then(|r| r.boss_room.as_deref())
        .cloned()
    else {
        return;
    };

    state.parent_intermission = state.current_room.take();
    state.current_room = Some(boss);
    state.in_boss_room = true;
    state.room_resolved = false;
    state.combat_turn = CombatTurn::Player;
    state.combat_round = 1;
    state.acted_this_round.clear();
    state.extra_actions = 0;
    state.victory = false;
    state.log("⚔️ You enter the Boss Chamber! Prepare for battle!");
    state.log("━━━ ROUND 1 ━━━");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_logged, test_enemy, ScriptedRolls, TestHarness};
    use crate::rules::combat::attack;
    use crate::world::{create_actor, create_initial_run_state};

    fn hazard() -> TestHarness {
        let mut harness = TestHarness::new("trap").at_depth(3);
        harness.state.current_room = Some(Room::new("room-3", RoomType::Hazard, "dungeon_start"));
        harness.state.room_resolved = false;
        harness
    }

    fn shrine(depth: u32) -> TestHarness {
        let mut harness = TestHarness::new("shrine").at_depth(depth);
        harness.state.current_room = Some(Room::new("room-5", RoomType::Shrine, "dungeon_start"));
        harness.state.room_resolved = false;
        harness
    }

    #[test]
    fn test_starting_shrine_blesses_weapon() {
        let mut state = create_initial_run_state("t1");
        let mut rolls = ScriptedRolls::new([]);
        pray_at_shrine(&mut state, &mut rolls).unwrap();

        assert!(state.room_resolved);
        let weapon = state.party.members[0].main_hand().unwrap();
        assert_eq!(weapon.name, "Rusty Sword of Striking");
        assert_eq!(weapon.enchantment.as_ref().map(|e| e.tier), Some(1));
        assert_eq!(
            weapon.history.last().map(String::as_str),
            Some("Blessed with Minor enchantment at starting shrine")
        );
        assert_eq!(
            state.shrine_boon.as_deref(),
            Some("⚔️ Minor Weapon Blessing! Your Rusty Sword becomes Rusty Sword of Striking! (+1 power)")
        );
    }

    #[test]
    fn test_starting_shrine_without_weapon_gives_gold() {
        let mut state = create_initial_run_state("bare");
        state.party.members[0].equipment.clear();
        let mut rolls = ScriptedRolls::new([20]);
        pray_at_shrine(&mut state, &mut rolls).unwrap();
        assert_eq!(state.party.gold, 20);
    }

    #[test]
    fn test_shrine_heal_with_cleric_bonus() {
        let mut harness = shrine(5);
        harness.state.short_rests_remaining = SHORT_RESTS_PER_SEGMENT;
        harness.state.party.members[0].hp.current = 2;
        harness
            .state
            .party
            .members
            .push(create_actor("party-2", "Marcus", Role::Cleric, 1, true));
        // Pool: heal, gold, full heal, enchant. Pick the first.
        let mut rolls = ScriptedRolls::new([0]);
        pray_at_shrine(&mut harness.state, &mut rolls).unwrap();
        // floor(floor(12 / 2) * 1.5) = 9
        assert_eq!(harness.hero_hp(), (11, 12));
        assert_logged(&harness, "Healed for 9 HP! (Cleric +50%)");
    }

    #[test]
    fn test_shrine_rest_boon_only_under_cap() {
        let mut harness = shrine(5);
        harness.state.short_rests_remaining = 0;
        harness.hero_mut().equipment.clear();
        // Healthy hero, no gear: pool is rest, gold.
        let mut rolls = ScriptedRolls::new([0]);
        pray_at_shrine(&mut harness.state, &mut rolls).unwrap();
        assert_eq!(harness.state.short_rests_remaining, 1);
        assert!(harness.state.shrine_boon.is_some());
    }

    #[test]
    fn test_guarded_shrine_blocks_prayer() {
        let harness = shrine(5).with_fight(RoomType::Shrine, vec![test_enemy("cultist", 5, 10, 1)]);
        assert!(!can_interact(&harness.state, RoomType::Shrine));
    }

    #[test]
    fn test_disarm_success() {
        let mut harness = hazard();
        let mut rolls = ScriptedRolls::new([10]).with_floats([0.5]);
        disarm_trap(&mut harness.state, &mut rolls).unwrap();
        assert!(harness.state.room_resolved);
        assert_eq!(harness.state.party.gold, 10);
        assert_logged(&harness, "Trap disarmed! (Rolled 10+2=12 vs DC 12). +10 gold.");
    }

    #[test]
    fn test_disarm_failure_hurts_front_member() {
        let mut harness = hazard();
        let mut rolls = ScriptedRolls::new([3, 4]);
        disarm_trap(&mut harness.state, &mut rolls).unwrap();
        assert_eq!(harness.hero_hp(), (8, 12));
        assert_logged(&harness, "Failed to disarm! (Rolled 5). Trap deals 4 damage!");
        assert!(!harness.state.game_over);
    }

    #[test]
    fn test_trigger_can_end_run() {
        let mut harness = hazard();
        harness.hero_mut().hp.current = 3;
        let mut rolls = ScriptedRolls::new([2, 2]);
        trigger_trap(&mut harness.state, &mut rolls).unwrap();
        assert!(harness.state.game_over);
        assert_logged(&harness, "Hero has fallen! Game Over.");
    }

    #[test]
    fn test_trigger_collects_loot() {
        let mut harness = hazard();
        if let Some(room) = harness.state.current_room.as_mut() {
            room.loot.push(crate::items::STARTER_SWORD.clone());
        }
        let mut rolls = ScriptedRolls::new([1, 1]);
        trigger_trap(&mut harness.state, &mut rolls).unwrap();
        assert_eq!(harness.state.inventory.items.len(), 1);
        assert_eq!(harness.state.inventory.items[0].id, "starter_sword-1");
        assert_logged(&harness, "🎁 Found Rusty Sword!");
    }

    #[test]
    fn test_resolve_room_settles_room() {
        let mut state = create_initial_run_state("legacy");
        state.depth = 1;
        let mut rng = crate::rng::SeededRng::new(7);
        resolve_room(&mut state, &mut rng);
        assert!(state.room_resolved);
        assert!(!state.in_combat());
        assert!(state.party.members[0].hp.current <= 12);
    }

    #[test]
    fn test_resolve_room_keeps_non_combat_room() {
        let mut harness = TestHarness::new("market").at_depth(4);
        let mut trader = Room::new("room-4", RoomType::Trader, "dungeon_start");
        trader.shop_items.push(crate::items::STARTER_SWORD.clone());
        trader.loot.push(crate::items::STARTER_SWORD.clone());
        harness.state.current_room = Some(trader.clone());
        harness.state.room_resolved = false;
        let hp = harness.hero_hp();

        let mut rolls = ScriptedRolls::new([1, 20, 6, 5]);
        resolve_room(&mut harness.state, &mut rolls);

        assert_eq!(harness.state.current_room, Some(trader));
        assert_eq!(harness.hero_hp(), hp);
        assert!(harness.state.room_resolved);
        assert_logged(&harness, "Resolved trader room safely.");
    }

    #[test]
    fn test_resolve_room_clears_only_enemies() {
        let mut harness = TestHarness::new("brawl")
            .at_depth(2)
            .with_fight(RoomType::Combat, vec![test_enemy("rat", 4, 10, 1)]);
        if let Some(room) = harness.state.current_room.as_mut() {
            room.loot.push(crate::items::STARTER_SWORD.clone());
        }
        let before = harness.state.current_room.clone().unwrap();

        // 1 + 4 vs 20 + 1: margin -16, damage 2 + 8 = 10, stress 2 + 8 = 10.
        let mut rolls = ScriptedRolls::new([1, 20, 2, 2]);
        resolve_room(&mut harness.state, &mut rolls);

        let after = harness.state.current_room.clone().unwrap();
        assert_eq!(after.id, before.id);
        assert_eq!(after.room_type, RoomType::Combat);
        assert_eq!(after.loot, before.loot);
        assert!(after.enemies.is_empty());
        assert_eq!(harness.hero_hp().0, 2);
        assert!(!harness.state.in_combat());
        assert_logged(&harness, "Combat resolved: Took 10 damage, 10 stress.");
    }

    #[test]
    fn test_enter_boss_room_and_back() {
        let mut state = create_initial_run_state("boss");
        let mut intermission = Room::new("room-10", RoomType::Intermission, "dungeon_start");
        let mut boss = Room::new("boss-10", RoomType::Boss, "dungeon_start");
        boss.enemies.push(test_enemy("king", 1, 5, 5));
        intermission.boss_room = Some(Box::new(boss));
        state.current_room = Some(intermission);
        state.depth = 10;

        enter_boss_room(&mut state);
        assert!(state.in_boss_room);
        assert_eq!(state.room_type(), Some(RoomType::Boss));
        assert_eq!(state.combat_turn, CombatTurn::Player);
        assert!(state.parent_intermission.is_some());

        let mut rolls = ScriptedRolls::new([20, 8]).with_floats([0.0, 0.99, 0.0, 0.0]);
        attack(&mut state, "hero-1", "king", &mut rolls).unwrap();
        assert!(!state.in_boss_room);
        assert_eq!(state.room_type(), Some(RoomType::Intermission));
        assert!(state.current_room.as_ref().unwrap().boss_room.is_none());
        assert!(state.shrine_boon.as_deref().unwrap().contains("Boss Blessing"));
        let weapon = state.party.members[0].main_hand().unwrap();
        assert_eq!(weapon.enchantment.as_ref().map(|e| e.tier), Some(3));
    }
}
