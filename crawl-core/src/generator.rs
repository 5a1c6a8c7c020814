//! Procedural room generation.
//!
//! Every room is a pure function of the run seed, the depth and the current
//! theme. Regenerating room N never requires replaying rooms 0..N-1.

use crate::content::{enemies::ENEMIES, room_weights, theme_def, EnemyDef, RECRUITS};
use crate::hash::hash_with_seed;
use crate::items::{items_of_rarity, Item, Rarity, ITEMS};
use crate::rng::{RandomSource, SeededRng};
use crate::world::{Enemy, RecruitOption, Room, RoomType, RunState};
use std::collections::HashMap;
use tracing::debug;

/// Maximum enemies in a generated room.
pub const MAX_ENEMIES: usize = 5;

/// Items stocked by traders and intermissions.
pub const SHOP_SIZE: usize = 4;

// ============================================================================
// Difficulty
// ============================================================================

/// Depth-derived scaling for enemies and escape checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Difficulty {
    /// 1 for depths 1-10, 2 for 11-20, and so on. Depth 0 is segment 0.
    pub segment: i32,
    /// 1 through 10.
    pub room_in_segment: i32,
    pub multiplier: f64,
    pub min_power: i32,
    pub max_power: i32,
    pub ac_bonus: i32,
    pub enemy_count_bonus: i32,
}

pub fn get_difficulty(depth: u32) -> Difficulty {
    let depth = depth as i32;
    let segment = (depth - 1).div_euclid(10) + 1;
    let room_in_segment = if depth % 10 == 0 { 10 } else { depth % 10 };

    let segment_multiplier = 1.0 + (segment - 1) as f64 * 0.3;
    let room_ramp = 1.0 + (room_in_segment - 1) as f64 * 0.025;

    let (min_power, max_power) = match segment {
        1 => (1, 2),
        2 => (2, 4),
        3 => (3, 6),
        4 => (5, 8),
        5 => (7, 10),
        _ => (9, 13),
    };

    Difficulty {
        segment,
        room_in_segment,
        multiplier: segment_multiplier * room_ramp,
        min_power,
        max_power,
        ac_bonus: ((segment - 1) as f64 * 1.5).floor() as i32,
        enemy_count_bonus: (segment - 1).div_euclid(2),
    }
}

/// Escape difficulty with a readable breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeDc {
    pub dc: i32,
    pub breakdown: String,
}

/// The single retreat gate. Every escape attempt rolls 1d20 against this.
pub fn calculate_escape_dc(
    depth: u32,
    enemy_count: usize,
    is_elite: bool,
    party_agility: i32,
    has_rogue: bool,
) -> EscapeDc {
    let difficulty = get_difficulty(depth);
    let mut dc = 10;
    let mut parts = vec!["Base: 10".to_string()];

    let segment_bonus = (difficulty.segment - 1) * 2;
    if segment_bonus > 0 {
        dc += segment_bonus;
        parts.push(format!("Segment {}: +{}", difficulty.segment, segment_bonus));
    }

    let enemy_bonus = enemy_count.saturating_sub(1) as i32;
    if enemy_bonus > 0 {
        dc += enemy_bonus;
        parts.push(format!("Enemies ({enemy_count}): +{enemy_bonus}"));
    }

    if is_elite {
        dc += 3;
        parts.push("Elite: +3".to_string());
    }

    if party_agility > 0 {
        dc -= party_agility;
        parts.push(format!("Agility: -{party_agility}"));
    }

    if has_rogue {
        dc -= 2;
        parts.push("Rogue: -2".to_string());
    }

    EscapeDc {
        dc: dc.max(5),
        breakdown: parts.join(", "),
    }
}

// ============================================================================
// Rooms
// ============================================================================

/// The generator a room at `depth` is built from.
pub fn room_rng(seed: &str, depth: u32) -> SeededRng {
    SeededRng::new(hash_with_seed(seed, depth as i32))
}

/// Generate the room for the state's depth from its own derived generator.
pub fn generate_room(state: &RunState) -> Room {
    let mut rng = room_rng(&state.seed, state.depth);
    generate_room_with(state, &mut rng)
}

/// Generate the room for the state's depth using the given generator.
pub fn generate_room_with<R: RandomSource>(state: &RunState, rng: &mut R) -> Room {
    let depth = state.depth;
    let difficulty = get_difficulty(depth);

    let (room_type, guarded) = pick_room_type(depth, difficulty.room_in_segment, rng);

    let mut room = Room::new(format!("room-{depth}"), room_type, state.theme_id.clone());

    if matches!(room_type, RoomType::Combat | RoomType::Elite) || guarded {
        room.enemies = populate_enemies(state, &difficulty, room_type, guarded, rng);
    }

    if room_type == RoomType::Hazard {
        let rarities: &[Rarity] = if guarded {
            &[Rarity::Uncommon, Rarity::Rare, Rarity::Epic]
        } else {
            &[Rarity::Common, Rarity::Uncommon]
        };
        let mut pool = items_of_rarity(rarities);
        rng.shuffle(&mut pool);
        let count = if guarded { rng.int(2, 3) } else { 1 };
        room.loot = take_cloned(&pool, count as usize);
    }

    if matches!(room_type, RoomType::Trader | RoomType::Intermission) {
        let mut stock: Vec<&'static Item> = ITEMS.iter().collect();
        rng.shuffle(&mut stock);
        room.shop_items = take_cloned(&stock, SHOP_SIZE);
    }

    if room_type == RoomType::Intermission {
        room.available_recruits = scaled_recruits(&difficulty, rng);
        room.boss_room = generate_boss_room(state, &difficulty, rng).map(Box::new);
    }

    debug!(
        depth,
        room_type = %room.room_type,
        guarded,
        enemies = room.enemies.len(),
        "generated room"
    );
    room
}

fn pick_room_type<R: RandomSource>(depth: u32, room_in_segment: i32, rng: &mut R) -> (RoomType, bool) {
    if depth > 0 && depth % 10 == 0 {
        return (RoomType::Intermission, false);
    }

    if depth == 0 || depth % 5 == 0 {
        let guarded = depth > 0 && rng.float() < (0.3 + depth as f64 * 0.01).min(0.7);
        return (RoomType::Shrine, guarded);
    }

    let weights = room_weights(room_in_segment);
    let total: i32 = weights.iter().map(|(_, w)| w).sum();
    let mut roll = rng.int(1, total);
    let mut room_type = RoomType::Combat;
    for (candidate, weight) in weights {
        roll -= weight;
        if roll <= 0 {
            room_type = candidate;
            break;
        }
    }

    let guarded =
        room_type == RoomType::Hazard && rng.float() < (0.25 + depth as f64 * 0.005).min(0.5);
    (room_type, guarded)
}

fn populate_enemies<R: RandomSource>(
    state: &RunState,
    difficulty: &Difficulty,
    room_type: RoomType,
    guarded: bool,
    rng: &mut R,
) -> Vec<Enemy> {
    let theme = theme_def(&state.theme_id);
    let in_band = |e: &&EnemyDef| e.power >= difficulty.min_power && e.power <= difficulty.max_power;

    let themed: Vec<&EnemyDef> = ENEMIES
        .iter()
        .filter(in_band)
        .filter(|e| e.tags.iter().any(|t| theme.enemy_tags.contains(t)))
        .collect();
    let pool: Vec<&EnemyDef> = if !themed.is_empty() {
        themed
    } else {
        let banded: Vec<&EnemyDef> = ENEMIES.iter().filter(in_band).collect();
        if banded.is_empty() {
            ENEMIES.iter().collect()
        } else {
            banded
        }
    };

    let base_count = if guarded {
        rng.int(1, 2)
    } else if room_type == RoomType::Elite {
        1
    } else {
        rng.int(1, 3)
    };
    let bonus = if guarded {
        0
    } else if rng.float() < 0.5 {
        difficulty.enemy_count_bonus
    } else {
        0
    };
    let count = (base_count + bonus).clamp(0, MAX_ENEMIES as i32) as usize;

    let elite = room_type == RoomType::Elite;
    let elite_bonus = if elite { 1.5 } else { 1.0 };
    let mut name_counts: HashMap<&str, u32> = HashMap::new();
    let mut enemies = Vec::with_capacity(count);

    for i in 0..count {
        let Ok(proto) = rng.pick(&pool) else {
            break;
        };
        let ordinal = name_counts.entry(proto.name).or_insert(0);
        *ordinal += 1;
        let display = if count > 1 {
            format!("{} {}", proto.name, ordinal)
        } else {
            proto.name.to_string()
        };

        let scaled_hp = (proto.hp as f64 * difficulty.multiplier).floor();
        let scaled_power = (proto.power as f64 * difficulty.multiplier).floor();
        let scaled_xp = (proto.power as f64 * 10.0 * difficulty.multiplier).floor();
        let ac = 10 + difficulty.ac_bonus + if elite { 2 } else { 0 };

        enemies.push(scale_enemy(
            proto,
            format!("{}-{}", proto.id, i),
            if elite { format!("Elite {display}") } else { display },
            (scaled_hp * elite_bonus).floor() as i32,
            ac,
            (scaled_power * elite_bonus).floor() as i32,
            (scaled_xp * elite_bonus).floor() as i32,
        ));
    }
    enemies
}

fn scaled_recruits<R: RandomSource>(difficulty: &Difficulty, rng: &mut R) -> Vec<RecruitOption> {
    let segment = difficulty.segment.max(1) as u32;
    let mut recruits: Vec<RecruitOption> = RECRUITS
        .iter()
        .map(|r| RecruitOption {
            id: r.id.to_string(),
            name: r.name.to_string(),
            role: r.role,
            cost: r.cost + (segment - 1) * 15,
            description: format!("{} (Level {segment})", r.description),
            level: segment,
        })
        .collect();
    rng.shuffle(&mut recruits);
    recruits.truncate(2);
    recruits
}

/// The optional boss challenge offered at an intermission.
fn generate_boss_room<R: RandomSource>(
    state: &RunState,
    difficulty: &Difficulty,
    rng: &mut R,
) -> Option<Room> {
    let max = difficulty.max_power;
    let in_range = |lo: i32| -> Vec<&'static EnemyDef> {
        ENEMIES
            .iter()
            .filter(|e| e.power >= lo && e.power <= max + 3)
            .collect()
    };

    let mut candidates = in_range(max + 1);
    if candidates.is_empty() {
        candidates = in_range(max);
    }
    let preferred: Vec<&'static EnemyDef> = candidates
        .iter()
        .copied()
        .filter(|e| e.has_tag("boss") || e.has_tag("elite"))
        .collect();
    let pool = if preferred.is_empty() { candidates } else { preferred };

    let proto = match rng.pick(&pool) {
        Ok(proto) => *proto,
        Err(_) => ENEMIES
            .iter()
            .find(|e| e.power == max)
            .or_else(|| ENEMIES.first())?,
    };

    let mult = difficulty.multiplier;
    let mut room = Room::new(
        format!("boss-room-{}", state.depth),
        RoomType::Boss,
        state.theme_id.clone(),
    );

    room.enemies.push(scale_enemy(
        proto,
        format!("{}-boss", proto.id),
        format!("{} (BOSS)", proto.name),
        (proto.hp as f64 * mult * 1.5).floor() as i32,
        12 + difficulty.ac_bonus + 1,
        (proto.power as f64 * mult * 1.25).floor() as i32,
        (proto.power as f64 * 25.0 * mult).floor() as i32,
    ));

    let minions: Vec<&EnemyDef> = ENEMIES
        .iter()
        .filter(|e| !e.has_tag("boss") && e.power >= difficulty.min_power && e.power <= max)
        .collect();
    let minion_count = rng.int(1, 2);
    for i in 0..minion_count {
        let Ok(minion) = rng.pick(&minions) else {
            break;
        };
        room.enemies.push(scale_enemy(
            minion,
            format!("{}-minion-{}", minion.id, i),
            minion.name.to_string(),
            (minion.hp as f64 * mult).floor() as i32,
            10 + difficulty.ac_bonus,
            (minion.power as f64 * mult).floor() as i32,
            (minion.power as f64 * 10.0 * mult).floor() as i32,
        ));
    }

    let mut loot_pool = items_of_rarity(&[Rarity::Rare, Rarity::Epic, Rarity::Legendary, Rarity::Godly]);
    rng.shuffle(&mut loot_pool);
    let loot_count = rng.int(3, 5);
    room.loot = take_cloned(&loot_pool, loot_count as usize);

    Some(room)
}

fn scale_enemy(
    proto: &EnemyDef,
    id: String,
    name: String,
    hp: i32,
    ac: i32,
    power: i32,
    xp: i32,
) -> Enemy {
    Enemy {
        id,
        name,
        hp,
        max_hp: hp,
        power,
        damage: proto.damage.to_string(),
        ac,
        xp,
        tags: proto.tags.iter().map(|t| t.to_string()).collect(),
        turned_rounds: 0,
    }
}

fn take_cloned(items: &[&'static Item], count: usize) -> Vec<Item> {
    items.iter().take(count).map(|i| (*i).clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRolls;
    use crate::world::create_initial_run_state;

    fn state_at(seed: &str, depth: u32) -> RunState {
        let mut state = create_initial_run_state(seed);
        state.depth = depth;
        state
    }

    #[test]
    fn test_difficulty_first_segment() {
        let d = get_difficulty(1);
        assert_eq!((d.segment, d.room_in_segment), (1, 1));
        assert_eq!(d.multiplier, 1.0);
        assert_eq!((d.min_power, d.max_power), (1, 2));
        assert_eq!((d.ac_bonus, d.enemy_count_bonus), (0, 0));

        let d = get_difficulty(10);
        assert_eq!((d.segment, d.room_in_segment), (1, 10));
    }

    #[test]
    fn test_difficulty_later_segments() {
        let d = get_difficulty(11);
        assert_eq!((d.segment, d.room_in_segment), (2, 1));
        assert!((d.multiplier - 1.3).abs() < 1e-9);
        assert_eq!((d.min_power, d.max_power), (2, 4));
        assert_eq!(d.ac_bonus, 1);

        let d = get_difficulty(35);
        assert_eq!(d.segment, 4);
        assert_eq!((d.ac_bonus, d.enemy_count_bonus), (4, 1));

        let d = get_difficulty(75);
        assert_eq!((d.min_power, d.max_power), (9, 13));
    }

    #[test]
    fn test_difficulty_depth_zero_floors() {
        let d = get_difficulty(0);
        assert_eq!((d.segment, d.room_in_segment), (0, 10));
        assert_eq!((d.ac_bonus, d.enemy_count_bonus), (-2, -1));
    }

    #[test]
    fn test_escape_dc_formula() {
        assert_eq!(calculate_escape_dc(1, 1, false, 0, false).dc, 10);

        let dc = calculate_escape_dc(11, 3, true, 5, true);
        assert_eq!(dc.dc, 10);
        assert_eq!(
            dc.breakdown,
            "Base: 10, Segment 2: +2, Enemies (3): +2, Elite: +3, Agility: -5, Rogue: -2"
        );

        assert_eq!(calculate_escape_dc(1, 1, false, 10, true).dc, 5);
        assert_eq!(calculate_escape_dc(0, 1, false, 0, false).dc, 10);
    }

    #[test]
    fn test_generation_is_deterministic() {
        for seed in ["t1", "alpha", "zz-top"] {
            for depth in 0..45 {
                let state = state_at(seed, depth);
                assert_eq!(generate_room(&state), generate_room(&state), "{seed}@{depth}");
            }
        }
    }

    #[test]
    fn test_segment_cadence() {
        for depth in [10, 20, 30, 40, 50] {
            let room = generate_room(&state_at("cadence", depth));
            assert_eq!(room.room_type, RoomType::Intermission, "depth {depth}");
        }
        for depth in [0, 5, 15, 25] {
            let room = generate_room(&state_at("cadence", depth));
            assert_eq!(room.room_type, RoomType::Shrine, "depth {depth}");
        }
    }

    #[test]
    fn test_starting_shrine_unguarded() {
        let room = generate_room(&state_at("t1", 0));
        assert_eq!(room.id, "room-0");
        assert!(room.enemies.is_empty());
    }

    #[test]
    fn test_first_room_of_segment_is_combat() {
        for seed in ["a", "b", "c", "d"] {
            let room = generate_room(&state_at(seed, 1));
            assert_eq!(room.room_type, RoomType::Combat);
            assert!((1..=3).contains(&room.enemies.len()));
            for enemy in &room.enemies {
                assert_eq!(enemy.ac, 10);
                assert!(enemy.hp > 0);
                assert_eq!(enemy.hp, enemy.max_hp);
            }
        }
    }

    #[test]
    fn test_intermission_contents() {
        let room = generate_room(&state_at("shop", 10));
        assert_eq!(room.shop_items.len(), SHOP_SIZE);
        assert_eq!(room.available_recruits.len(), 2);
        for recruit in &room.available_recruits {
            assert_eq!(recruit.level, 1);
            assert!(recruit.description.ends_with("(Level 1)"));
        }

        let boss_room = room.boss_room.as_deref().unwrap();
        assert_eq!(boss_room.id, "boss-room-10");
        assert_eq!(boss_room.room_type, RoomType::Boss);
        let boss = &boss_room.enemies[0];
        assert!(boss.name.ends_with("(BOSS)"));
        assert_eq!(boss.ac, 13);
        assert!((2..=3).contains(&boss_room.enemies.len()));
        assert!((3..=5).contains(&boss_room.loot.len()));
        assert!(boss_room.loot.iter().all(|i| i.rarity >= Rarity::Rare));
    }

    #[test]
    fn test_recruits_scale_with_segment() {
        let room = generate_room(&state_at("shop", 30));
        for recruit in &room.available_recruits {
            assert_eq!(recruit.level, 3);
            let base = RECRUITS.iter().find(|r| r.id == recruit.id).unwrap();
            assert_eq!(recruit.cost, base.cost + 30);
        }
    }

    #[test]
    fn test_scripted_unguarded_hazard() {
        // Weight roll 60 lands in hazard (50 combat, 20 hazard).
        let state = state_at("scripted", 2);
        let mut rolls = ScriptedRolls::new([60]).with_floats([0.99]);
        let room = generate_room_with(&state, &mut rolls);
        assert_eq!(room.room_type, RoomType::Hazard);
        assert!(room.enemies.is_empty());
        assert_eq!(room.loot.len(), 1);
        assert!(room.loot[0].rarity <= Rarity::Uncommon);
    }

    #[test]
    fn test_scripted_guarded_hazard() {
        let state = state_at("scripted", 2);
        let mut rolls = ScriptedRolls::new([60, 2]).with_floats([0.0]);
        let room = generate_room_with(&state, &mut rolls);
        assert_eq!(room.room_type, RoomType::Hazard);
        assert_eq!(room.enemies.len(), 2);
        assert!(room.enemies[0].name.ends_with(" 1"));
        assert_eq!(room.loot.len(), 2);
        assert!(room.loot.iter().all(|i| i.rarity >= Rarity::Uncommon));
    }

    #[test]
    fn test_scripted_elite_room() {
        // Room 8 weights: combat 50, hazard 20, shrine 10, trader 10, elite 26.
        let state = state_at("scripted", 8);
        let mut rolls = ScriptedRolls::new([116]).with_floats([0.9]);
        let room = generate_room_with(&state, &mut rolls);
        assert_eq!(room.room_type, RoomType::Elite);
        assert_eq!(room.enemies.len(), 1);
        let elite = &room.enemies[0];
        assert!(elite.name.starts_with("Elite "));
        assert!(!elite.name.ends_with(" 1"));
        assert_eq!(elite.ac, 12);
    }
}
