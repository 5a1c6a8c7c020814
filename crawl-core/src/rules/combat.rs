//! Fights: initiative, attacks, abilities, escape and the enemy turn.

use super::rooms::enter_room;
use super::{d20, ActionError};
use crate::content::abilities::{get_ability, EffectKind, EffectTarget, UNTIL_REST};
use crate::dice::{roll, DiceExpression};
use crate::enchant::{enchant_equipped_at, make_godly, roll_boss_tier, tier_name};
use crate::generator::{calculate_escape_dc, generate_room_with};
use crate::hash::hash_with_seed;
use crate::items::{roll_drop, DropTier, WeaponKind};
use crate::rng::{RandomSource, SeededRng};
use crate::world::{CombatTurn, Enemy, EquipmentSlot, Role, Room, RoomType, RunState};
use tracing::{debug, info};

/// XP needed to reach level `n + 1`, indexed by current level.
pub const XP_THRESHOLDS: [u32; 9] = [0, 50, 150, 300, 500, 800, 1200, 2000, 3000];

pub const MAX_LEVEL: u32 = 8;

// Statuses read or cleared during a fight.
const HIDDEN: &str = "hidden";
const SHIELDED: &str = "shielded";
const EVASION: &str = "evasion";
const CHAMPION_STRIKE: &str = "champion_strike";

// ============================================================================
// Validation
// ============================================================================

/// Whether the member may take a turn action right now.
pub fn can_act(state: &RunState, actor_id: &str) -> bool {
    state.combat_turn == CombatTurn::Player
        && state.party.member(actor_id).is_some_and(|m| m.is_alive)
        && (!has_acted(state, actor_id) || state.extra_actions > 0)
}

pub fn can_attack(state: &RunState, attacker_id: &str, target_id: &str) -> bool {
    can_act(state, attacker_id) && living_enemy_index(state, target_id).is_some()
}

pub fn can_use_ability(
    state: &RunState,
    actor_id: &str,
    ability_id: &str,
    target_id: Option<&str>,
) -> bool {
    let Some(def) = get_ability(ability_id) else {
        return false;
    };
    if state.combat_turn != CombatTurn::Player {
        return false;
    }
    let Some(actor) = state.party.member(actor_id).filter(|m| m.is_alive) else {
        return false;
    };
    let ready = actor
        .ability_state(ability_id)
        .is_some_and(|a| a.current_cooldown == 0);
    if !ready {
        return false;
    }
    if def.requires_status.is_some_and(|s| !actor.has_status(s)) {
        return false;
    }
    if !def.free_action && !can_act(state, actor_id) {
        return false;
    }

    match def.effect.target {
        EffectTarget::Enemy => target_id.is_some_and(|t| living_enemy_index(state, t).is_some()),
        EffectTarget::Ally => {
            target_id.map_or(true, |t| state.party.member(t).is_some_and(|m| m.is_alive))
        }
        EffectTarget::SelfOnly | EffectTarget::AllEnemies => true,
    }
}

/// Escape is possible from ordinary fights and guarded rooms, never from a
/// boss chamber.
pub fn can_escape(state: &RunState) -> bool {
    if state.combat_turn != CombatTurn::Player {
        return false;
    }
    match state.current_room.as_ref() {
        Some(room) => match room.room_type {
            RoomType::Combat | RoomType::Elite => true,
            RoomType::Shrine | RoomType::Hazard => room.has_living_enemies(),
            _ => false,
        },
        None => false,
    }
}

fn has_acted(state: &RunState, actor_id: &str) -> bool {
    state.acted_this_round.iter().any(|id| id == actor_id)
}

fn living_enemy_index(state: &RunState, enemy_id: &str) -> Option<usize> {
    state
        .current_room
        .as_ref()?
        .enemies
        .iter()
        .position(|e| e.id == enemy_id && e.is_alive())
}

fn enemy_mut(state: &mut RunState, index: usize) -> Option<&mut Enemy> {
    state.current_room.as_mut()?.enemies.get_mut(index)
}

fn best_party_agility(state: &RunState) -> i32 {
    state
        .party
        .living()
        .map(|m| m.skills.agility)
        .max()
        .unwrap_or(0)
        .max(0)
}

// ============================================================================
// Turn flow
// ============================================================================

/// Roll initiative for a fresh fight and report who goes first.
pub fn roll_initiative<R: RandomSource>(state: &mut RunState, rng: &mut R) -> CombatTurn {
    let agility = best_party_agility(state);
    let enemy_power = state
        .current_room
        .as_ref()
        .and_then(|r| r.living_enemies().map(|e| e.power).max())
        .unwrap_or(0);

    let party = d20(rng) + agility;
    let enemies = d20(rng) + enemy_power / 2;
    state.log(format!("⚔️ Initiative: Party {party} vs Enemies {enemies}"));
    debug!(party, enemies, "initiative");

    if enemies > party {
        state.log("Enemies act first!");
        CombatTurn::Enemy
    } else {
        state.log("Party acts first!");
        CombatTurn::Player
    }
}

/// Mark the actor's action as spent, drawing on extra actions for repeats.
fn spend_action(state: &mut RunState, actor_id: &str) {
    if has_acted(state, actor_id) {
        state.extra_actions = state.extra_actions.saturating_sub(1);
        let line = if state.extra_actions > 0 {
            format!("(Using extra action! {} remaining)", state.extra_actions)
        } else {
            "(Using extra action!)".to_string()
        };
        state.log(line);
    } else {
        state.acted_this_round.push(actor_id.to_string());
    }
}

/// After a spent action: hand the turn to the next member, or to the
/// enemies once everyone has acted.
fn finish_player_action<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let waiting = state
        .party
        .living()
        .find(|m| !state.acted_this_round.contains(&m.id))
        .map(|m| m.name.clone());

    if let Some(name) = waiting {
        state.log(format!("→ {name}'s turn"));
        return Ok(());
    }
    if state.extra_actions > 0 {
        state.log("(Extra action available!)");
        return Ok(());
    }
    enemy_turn(state, rng)
}

/// Every living enemy acts, then the round ends.
pub fn enemy_turn<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    state.combat_turn = CombatTurn::Enemy;
    state.acted_this_round.clear();

    enemy_attacks(state, rng, false)?;

    for member in &mut state.party.members {
        member.remove_status(SHIELDED);
    }

    if state.party.living().next().is_none() {
        party_wiped(state);
        return Ok(());
    }

    for member in &mut state.party.members {
        for ability in &mut member.abilities {
            if ability.current_cooldown > 0 && ability.current_cooldown < UNTIL_REST {
                ability.current_cooldown -= 1;
            }
        }
    }

    state.combat_round += 1;
    state.log(format!("━━━ ROUND {} ━━━", state.combat_round));
    state.combat_turn = CombatTurn::Player;
    debug!(round = state.combat_round, "enemy turn finished");
    Ok(())
}

/// One attack from each living enemy against a random visible member.
///
/// `free` marks the attacks an enemy gets when an escape fails.
fn enemy_attacks<R: RandomSource>(state: &mut RunState, rng: &mut R, free: bool) -> Result<(), ActionError> {
    let count = state.current_room.as_ref().map_or(0, |r| r.enemies.len());

    for index in 0..count {
        let Some(enemy) = enemy_mut(state, index) else {
            break;
        };
        if !enemy.is_alive() {
            continue;
        }
        if enemy.turned_rounds > 0 {
            enemy.turned_rounds -= 1;
            let line = format!("{} cowers in fear!", enemy.name);
            state.log(line);
            continue;
        }
        let (enemy_name, power, damage) = (enemy.name.clone(), enemy.power, enemy.damage.clone());

        let targets: Vec<usize> = state
            .party
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_alive && !m.has_status(HIDDEN))
            .map(|(i, _)| i)
            .collect();
        if targets.is_empty() {
            break;
        }
        let target = *rng.pick(&targets)?;

        let member = &mut state.party.members[target];
        let target_name = member.name.clone();
        let ac = member.armor_class();
        let natural = d20(rng);
        let total = natural + power;

        if total < ac {
            let line = if free {
                format!("💨 {enemy_name} attacks {target_name}: MISS!")
            } else {
                format!("{enemy_name} attacks {target_name}: [{natural}+{power}={total} vs AC {ac}] MISS!")
            };
            state.log(line);
            continue;
        }

        if member.remove_status(EVASION) {
            state.log(format!("{target_name} evades {enemy_name}'s attack!"));
            continue;
        }

        let dealt = roll(&damage, rng)?.total.max(0);
        let fell = member.take_damage(dealt);
        if free {
            state.log(format!("💥 {enemy_name} attacks {target_name}: HIT! {dealt} damage!"));
            if fell {
                state.log(format!("☠️ {target_name} has fallen!"));
            }
        } else {
            state.log(format!(
                "{enemy_name} attacks {target_name}: [{natural}+{power}={total} vs AC {ac}] HIT! {dealt} damage!"
            ));
            if fell {
                state.log(format!("{target_name} has fallen!"));
            }
        }
    }
    Ok(())
}

fn party_wiped(state: &mut RunState) {
    state.log("The entire party has fallen! Game Over.");
    state.room_resolved = true;
    state.combat_turn = CombatTurn::None;
    state.acted_this_round.clear();
    state.game_over = true;
    info!(depth = state.depth, "party wiped");
}

fn reveal(state: &mut RunState, actor_id: &str, line: impl FnOnce(&str) -> String) {
    let Some(member) = state.party.member_mut(actor_id) else {
        return;
    };
    if member.remove_status(HIDDEN) {
        let line = line(&member.name);
        state.log(line);
    }
}

fn remove_dead_enemies(state: &mut RunState) {
    if let Some(room) = state.current_room.as_mut() {
        room.enemies.retain(Enemy::is_alive);
    }
}

// ============================================================================
// Attack
// ============================================================================

/// A basic weapon attack.
pub fn attack<R: RandomSource>(
    state: &mut RunState,
    attacker_id: &str,
    target_id: &str,
    rng: &mut R,
) -> Result<(), ActionError> {
    let Some(attacker) = state.party.member(attacker_id) else {
        return Ok(());
    };
    let Some(target_index) = living_enemy_index(state, target_id) else {
        return Ok(());
    };

    let kind = attacker
        .main_hand()
        .map_or(WeaponKind::Melee, |w| w.effective_weapon_kind());
    let (hit_skill, damage_skill) = match kind {
        WeaponKind::Melee => (attacker.skills.attack, attacker.skills.strength),
        WeaponKind::Ranged => (attacker.skills.ranged, attacker.skills.ranged),
        WeaponKind::Magic => (attacker.skills.magic, attacker.skills.magic),
    };
    let gear = attacker.equipment_totals();
    let attack_bonus = hit_skill + gear.attack_bonus;
    let damage_bonus = damage_skill + gear.damage_bonus;
    let attacker_name = attacker.name.clone();

    let Some(target) = enemy_mut(state, target_index) else {
        return Ok(());
    };
    let (target_name, target_ac) = (target.name.clone(), target.ac);

    spend_action(state, attacker_id);

    let natural = d20(rng);
    let total = natural + attack_bonus;

    if total >= target_ac {
        let critical = natural == 20;
        let die = DiceExpression::new(1, 8, 0).roll_with(rng).total;
        let mut damage = (die + damage_bonus).max(1);

        let striking = state
            .party
            .member_mut(attacker_id)
            .is_some_and(|m| m.remove_status(CHAMPION_STRIKE));
        if striking {
            let bonus = DiceExpression::new(2, 6, 0).roll_with(rng).total;
            damage += bonus;
            state.log(format!("{attacker_name} consumes Champion Strike! +{bonus} damage."));
        }

        let mut defeated = None;
        if let Some(target) = enemy_mut(state, target_index) {
            target.hp = (target.hp - damage).max(0);
            if !target.is_alive() {
                defeated = Some(target.clone());
            }
        }

        if let Some(weapon) = state
            .party
            .member_mut(attacker_id)
            .and_then(|m| m.equipment.get_mut(&EquipmentSlot::MainHand))
        {
            weapon.record_hit(damage, defeated.as_ref().map(|e| e.name.as_str()), critical);
        }

        let crit = if critical { "CRITICAL " } else { "" };
        state.log(format!(
            "{attacker_name} attacks {target_name} ({kind}): [{natural}+{attack_bonus}={total} vs AC {target_ac}] {crit}HIT! {die}+{damage_bonus} = {damage} damage!"
        ));

        if let Some(enemy) = defeated {
            award_kill(state, &enemy, rng);
        }
    } else {
        state.log(format!(
            "{attacker_name} attacks {target_name}: [{natural}+{attack_bonus}={total} vs AC {target_ac}] MISS!"
        ));
    }

    reveal(state, attacker_id, |name| {
        format!("{name} reveals themselves from the shadows!")
    });
    remove_dead_enemies(state);

    if !state.room_has_living_enemies() {
        return victory(state, rng);
    }
    finish_player_action(state, rng)
}

/// Gold, a possible drop and XP for a kill made with a weapon.
fn award_kill<R: RandomSource>(state: &mut RunState, enemy: &Enemy, rng: &mut R) {
    let power = enemy.power.max(0) as u32;
    let gold = power * 3 + (rng.float() * (power * 2) as f64).floor() as u32;
    state.party.gold += gold;

    let tier = match state.room_type() {
        Some(RoomType::Boss) => DropTier::Boss,
        Some(RoomType::Elite) => DropTier::Elite,
        _ => DropTier::for_power(enemy.power),
    };
    if let Some((template, godly)) = roll_drop(tier, rng) {
        let mut item = state.mint_item(template);
        if godly {
            make_godly(&mut item, rng);
        }
        state.log(format!("🎁 {} dropped {}!", enemy.name, item.display_name()));
        state.inventory.items.push(item);
    }

    let xp = power * 15;
    state.log(format!("{} defeated! +{gold} gold, +{xp} XP", enemy.name));
    award_xp(state, xp, rng);
}

/// Split XP evenly over the living members and apply any level-ups.
pub fn award_xp<R: RandomSource>(state: &mut RunState, xp: u32, rng: &mut R) {
    let living = state.party.living().count() as u32;
    if living == 0 || xp == 0 {
        return;
    }
    let share = xp / living;

    let mut lines = Vec::new();
    for member in state.party.members.iter_mut().filter(|m| m.is_alive) {
        member.xp += share;
        while member.level < MAX_LEVEL && member.xp >= XP_THRESHOLDS[member.level as usize] {
            member.level += 1;
            member.stat_points += 1;

            let rolled = DiceExpression::new(1, 8, 0).roll_with(rng).total;
            let gain = (rolled + member.level as i32 / 2).max(1);
            member.hp.max += gain;
            member.hp.current += gain;
            if member.level % 2 == 0 {
                member.hit_dice.max += 1;
                member.hit_dice.current += 1;
            }
            lines.push(format!(
                "🎉 {} leveled up to {}! +{gain} HP (rolled {rolled}), +1 Stat Point!",
                member.name, member.level
            ));
        }
    }
    for line in lines {
        state.log(line);
    }
}

/// The last enemy is down.
pub fn victory<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let boss = state.in_boss_room;
    let gold = if boss {
        (20.0 + rng.float() * 30.0).floor() as u32
    } else {
        (5.0 + rng.float() * 11.0).floor() as u32
    };
    state.party.gold += gold;
    state.log(format!("Victory! All enemies defeated. +{gold} gold."));

    state.combat_turn = CombatTurn::None;
    state.acted_this_round.clear();
    state.extra_actions = 0;
    state.victory = true;

    if boss {
        if let Some(parent) = state.parent_intermission.take() {
            return_from_boss(state, parent, rng);
            info!(depth = state.depth, "boss defeated");
            return Ok(());
        }
        state.in_boss_room = false;
    }

    if matches!(state.room_type(), Some(RoomType::Combat | RoomType::Elite)) {
        state.room_resolved = true;
    }
    info!(depth = state.depth, gold, "victory");
    Ok(())
}

fn return_from_boss<R: RandomSource>(state: &mut RunState, mut parent: Room, rng: &mut R) {
    let loot = state
        .current_room
        .as_mut()
        .map(|r| std::mem::take(&mut r.loot))
        .unwrap_or_default();
    let minted: Vec<_> = loot.iter().map(|t| state.mint_item(t)).collect();
    if !minted.is_empty() {
        let names: Vec<&str> = minted.iter().map(|i| i.display_name()).collect();
        state.log(format!("🎁 Boss Loot Collected: {}", names.join(", ")));
        state.inventory.items.extend(minted);
    }

    state.log("🏆 Boss Defeated! Returning to rest area with a rare blessing...");
    let tier = roll_boss_tier(rng);
    let wielder = state
        .party
        .members
        .iter()
        .position(|m| m.is_alive && m.main_hand().is_some());
    if let Some(index) = wielder {
        let member = &mut state.party.members[index];
        if let Some(outcome) = enchant_equipped_at(member, EquipmentSlot::MainHand, tier, rng) {
            let line = format!(
                "✨ {}'s {} becomes {}! (+{} power)",
                member.name, outcome.old_name, outcome.new_name, outcome.bonus
            );
            state.log(line);
        }
    }
    state.shrine_boon = Some(format!(
        "🏆 {} Boss Blessing! Your weapon glows with power!",
        tier_name(tier)
    ));

    parent.boss_room = None;
    state.current_room = Some(parent);
    state.in_boss_room = false;
    state.room_resolved = true;
}

// ============================================================================
// Abilities
// ============================================================================

/// Use a class ability. Assumes [`can_use_ability`] passed.
pub fn use_ability<R: RandomSource>(
    state: &mut RunState,
    actor_id: &str,
    ability_id: &str,
    target_id: Option<&str>,
    rng: &mut R,
) -> Result<(), ActionError> {
    let Some(def) = get_ability(ability_id) else {
        return Ok(());
    };
    let Some(actor) = state.party.member(actor_id) else {
        return Ok(());
    };
    let effect = def.effect;
    let actor_name = actor.name.clone();
    let level = actor.level as i32;
    let gear = actor.equipment_totals();

    let aoe = effect.target == EffectTarget::AllEnemies && effect.kind != EffectKind::Debuff;
    let offensive = effect.kind.is_offensive() || aoe;

    let (accuracy, power) = match effect.kind {
        EffectKind::Attack => (
            actor.skills.ranged + gear.attack_bonus + effect.attack_bonus,
            actor.skills.ranged + gear.damage_bonus + effect.damage_bonus,
        ),
        EffectKind::Damage => (
            actor.skills.magic + gear.attack_bonus,
            actor.skills.magic + gear.damage_bonus + effect.modifier,
        ),
        EffectKind::Special if aoe => (
            actor.skills.ranged + gear.attack_bonus,
            actor.skills.ranged + gear.damage_bonus,
        ),
        _ => (0, actor.skills.faith),
    };

    if !def.free_action {
        spend_action(state, actor_id);
    }
    if let Some(actor) = state.party.member_mut(actor_id) {
        actor.set_cooldown(def.id, def.cooldown.value());
    }

    let fallback = if effect.kind == EffectKind::Attack { "1d8" } else { "1d6" };
    let dice = effect.dice.unwrap_or(fallback);
    let mut felled: Vec<Enemy> = Vec::new();

    if aoe {
        state.log(format!("{actor_name} uses {}! AOE Damage!", def.name));
        let count = state.current_room.as_ref().map_or(0, |r| r.enemies.len());
        for index in 0..count {
            let damage = roll(dice, rng)?.total + power;
            let Some(enemy) = enemy_mut(state, index).filter(|e| e.is_alive()) else {
                continue;
            };
            enemy.hp = (enemy.hp - damage.max(0)).max(0);
            if !enemy.is_alive() {
                felled.push(enemy.clone());
            }
        }
    } else {
        match effect.kind {
            EffectKind::Damage | EffectKind::Attack => {
                let Some(index) = target_id.and_then(|t| living_enemy_index(state, t)) else {
                    return Ok(());
                };
                let Some(target) = enemy_mut(state, index) else {
                    return Ok(());
                };
                let (target_name, ac) = (target.name.clone(), target.ac);
                let total = d20(rng) + accuracy;
                if total >= ac {
                    let damage = (roll(dice, rng)?.total + power).max(1);
                    if let Some(target) = enemy_mut(state, index) {
                        target.hp = (target.hp - damage).max(0);
                        if !target.is_alive() {
                            felled.push(target.clone());
                        }
                    }
                    state.log(format!(
                        "{actor_name} uses {} on {target_name}: [{total} vs AC {ac}] HIT! {damage} damage.",
                        def.name
                    ));
                } else {
                    state.log(format!(
                        "{actor_name} uses {} on {target_name}: [{total} vs AC {ac}] MISS!",
                        def.name
                    ));
                }
            }
            EffectKind::Heal => {
                let target = match effect.target {
                    EffectTarget::Ally => target_id.unwrap_or(actor_id),
                    _ => actor_id,
                };
                let amount = roll(effect.dice.unwrap_or("1d4"), rng)?.total + level + power;
                if let Some(member) = state.party.member_mut(target).filter(|m| m.is_alive) {
                    let healed = member.hp.restore(amount.max(0));
                    let line = format!("{actor_name} heals {} for {healed} HP.", member.name);
                    state.log(line);
                }
            }
            EffectKind::Debuff => {
                let rounds = effect.modifier.max(1) as u32;
                let mut turned = 0;
                if let Some(room) = state.current_room.as_mut() {
                    for enemy in room.enemies.iter_mut().filter(|e| e.is_alive() && e.has_tag("undead")) {
                        enemy.turned_rounds = rounds;
                        turned += 1;
                    }
                }
                if turned > 0 {
                    state.log(format!("{actor_name} uses {}! {turned} undead cower in fear.", def.name));
                } else {
                    state.log(format!("{actor_name} uses {}, but no undead are present.", def.name));
                }
            }
            EffectKind::Buff | EffectKind::Special => match effect.status {
                Some(status) => {
                    if let Some(member) = state.party.member_mut(actor_id) {
                        if member.add_status(status) {
                            let name = member.name.clone();
                            state.log(format!("{name} gains {status}!"));
                            if status == HIDDEN {
                                state.log(format!("{name} slips into the shadows."));
                            }
                        }
                    }
                }
                None => {
                    state.extra_actions += 1;
                    state.log(format!(
                        "{actor_name} surges with energy ({})! Take another action!",
                        def.name
                    ));
                }
            },
        }
    }

    if offensive {
        reveal(state, actor_id, |name| format!("{name} reveals themselves!"));
    }

    for enemy in &felled {
        let gold = enemy.power.max(0) as u32 * 2;
        state.party.gold += gold;
        state.log(format!("{} defeated! +{gold} Gold", enemy.name));
    }
    remove_dead_enemies(state);

    if offensive && !state.room_has_living_enemies() {
        return victory(state, rng);
    }
    if def.free_action {
        return Ok(());
    }
    finish_player_action(state, rng)
}

// ============================================================================
// Escape
// ============================================================================

/// Roll to flee. Success moves the party one room deeper.
pub fn escape<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    let Some(room) = state.current_room.as_ref() else {
        return Ok(());
    };
    let enemy_count = room.living_enemies().count();
    let is_elite = room.room_type == RoomType::Elite;
    let dc = calculate_escape_dc(
        state.depth,
        enemy_count,
        is_elite,
        best_party_agility(state),
        state.party.has_living(Role::Rogue),
    );

    let natural = d20(rng);
    if natural >= dc.dc {
        state.log(format!(
            "🏃 Escape attempt: [{natural} vs DC {}] SUCCESS! ({})",
            dc.dc, dc.breakdown
        ));
        let retreat = hash_with_seed(&format!("{}retreat", state.seed), state.depth as i32);
        state.depth += 1;
        let mut room_rng = SeededRng::new(retreat);
        let room = generate_room_with(state, &mut room_rng);
        enter_room(state, room);
        if state.in_combat() {
            state.log("━━━ ROUND 1 ━━━");
        }
        info!(depth = state.depth, "escaped");
        return Ok(());
    }

    state.log(format!(
        "🏃 Escape attempt: [{natural} vs DC {}] FAILED! Enemies attack! ({})",
        dc.dc, dc.breakdown
    ));
    enemy_attacks(state, rng, true)?;
    if state.party.living().next().is_none() {
        party_wiped(state);
    }
    Ok(())
}
