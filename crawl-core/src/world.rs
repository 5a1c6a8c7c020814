//! Run state: the party, the current room, and everything a save holds.
//!
//! `RunState` is plain data. It carries no generator or callback, so a run is
//! fully described by its JSON form.

use crate::content::{abilities, classes, themes};
use crate::items::{Item, ItemType, StatBonuses, STARTER_SWORD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maximum lines kept in the run log.
pub const HISTORY_LIMIT: usize = 100;

/// Party size cap.
pub const MAX_PARTY_SIZE: usize = 4;

/// Short rests granted per segment.
pub const SHORT_RESTS_PER_SEGMENT: u32 = 2;

// ============================================================================
// Roles and skills
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Fighter,
    Wizard,
    Rogue,
    Cleric,
    Ranger,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Fighter,
        Role::Wizard,
        Role::Rogue,
        Role::Cleric,
        Role::Ranger,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Fighter => "fighter",
            Role::Wizard => "wizard",
            Role::Rogue => "rogue",
            Role::Cleric => "cleric",
            Role::Ranger => "ranger",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The seven trainable skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Strength,
    Attack,
    Defense,
    Magic,
    Ranged,
    Faith,
    Agility,
}

impl Skill {
    pub const ALL: [Skill; 7] = [
        Skill::Strength,
        Skill::Attack,
        Skill::Defense,
        Skill::Magic,
        Skill::Ranged,
        Skill::Faith,
        Skill::Agility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Strength => "strength",
            Skill::Attack => "attack",
            Skill::Defense => "defense",
            Skill::Magic => "magic",
            Skill::Ranged => "ranged",
            Skill::Faith => "faith",
            Skill::Agility => "agility",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Skill::ALL
            .into_iter()
            .find(|skill| skill.name() == lower)
            .ok_or_else(|| format!("unknown skill: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skills {
    pub strength: i32,
    pub attack: i32,
    pub defense: i32,
    pub magic: i32,
    pub ranged: i32,
    pub faith: i32,
    pub agility: i32,
}

impl Skills {
    pub fn get(&self, skill: Skill) -> i32 {
        match skill {
            Skill::Strength => self.strength,
            Skill::Attack => self.attack,
            Skill::Defense => self.defense,
            Skill::Magic => self.magic,
            Skill::Ranged => self.ranged,
            Skill::Faith => self.faith,
            Skill::Agility => self.agility,
        }
    }

    pub fn get_mut(&mut self, skill: Skill) -> &mut i32 {
        match skill {
            Skill::Strength => &mut self.strength,
            Skill::Attack => &mut self.attack,
            Skill::Defense => &mut self.defense,
            Skill::Magic => &mut self.magic,
            Skill::Ranged => &mut self.ranged,
            Skill::Faith => &mut self.faith,
            Skill::Agility => &mut self.agility,
        }
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A current/max pair, used for HP and stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub current: i32,
    pub max: i32,
}

impl Pool {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }

    pub fn empty(max: i32) -> Self {
        Self { current: 0, max }
    }

    /// Reduce current, floored at zero. Returns the new value.
    pub fn take(&mut self, amount: i32) -> i32 {
        self.current = (self.current - amount).max(0);
        self.current
    }

    /// Raise current, capped at max. Returns the amount actually restored.
    pub fn restore(&mut self, amount: i32) -> i32 {
        let old = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - old
    }

    pub fn is_damaged(&self) -> bool {
        self.current < self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitDice {
    pub current: u32,
    pub max: u32,
    pub die: u32,
}

/// Cooldown tracking for one ability on one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityState {
    pub ability_id: String,
    pub current_cooldown: u32,
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Neck,
    Chest,
    Legs,
    Feet,
    MainHand,
    OffHand,
    Ring1,
    Ring2,
}

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; 9] = [
        EquipmentSlot::Head,
        EquipmentSlot::Neck,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
        EquipmentSlot::MainHand,
        EquipmentSlot::OffHand,
        EquipmentSlot::Ring1,
        EquipmentSlot::Ring2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EquipmentSlot::Head => "head",
            EquipmentSlot::Neck => "neck",
            EquipmentSlot::Chest => "chest",
            EquipmentSlot::Legs => "legs",
            EquipmentSlot::Feet => "feet",
            EquipmentSlot::MainHand => "main_hand",
            EquipmentSlot::OffHand => "off_hand",
            EquipmentSlot::Ring1 => "ring1",
            EquipmentSlot::Ring2 => "ring2",
        }
    }

    /// The slot an item goes into when none is given.
    ///
    /// Rings fill the first free ring slot and replace `ring1` when both are
    /// taken.
    pub fn for_item(item_type: ItemType, equipment: &Equipment) -> EquipmentSlot {
        match item_type {
            ItemType::Weapon => EquipmentSlot::MainHand,
            ItemType::Shield => EquipmentSlot::OffHand,
            ItemType::Head => EquipmentSlot::Head,
            ItemType::Chest => EquipmentSlot::Chest,
            ItemType::Legs => EquipmentSlot::Legs,
            ItemType::Feet => EquipmentSlot::Feet,
            ItemType::Neck => EquipmentSlot::Neck,
            ItemType::Ring => {
                if !equipment.contains_key(&EquipmentSlot::Ring1) {
                    EquipmentSlot::Ring1
                } else if !equipment.contains_key(&EquipmentSlot::Ring2) {
                    EquipmentSlot::Ring2
                } else {
                    EquipmentSlot::Ring1
                }
            }
        }
    }
}

impl fmt::Display for EquipmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for EquipmentSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        EquipmentSlot::ALL
            .into_iter()
            .find(|slot| slot.name() == lower)
            .ok_or_else(|| format!("unknown slot: {s}"))
    }
}

/// At most one item per slot.
pub type Equipment = BTreeMap<EquipmentSlot, Item>;

// ============================================================================
// Actors
// ============================================================================

/// A party member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub level: u32,
    pub xp: u32,
    pub stat_points: u32,
    pub skills: Skills,
    pub hp: Pool,
    pub stress: Pool,
    pub hit_dice: HitDice,
    pub is_alive: bool,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub abilities: Vec<AbilityState>,
    #[serde(default)]
    pub statuses: Vec<String>,
}

impl Actor {
    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Add a status. Returns false if it was already present.
    pub fn add_status(&mut self, status: &str) -> bool {
        if self.has_status(status) {
            return false;
        }
        self.statuses.push(status.to_string());
        true
    }

    /// Remove a status. Returns true if it was present.
    pub fn remove_status(&mut self, status: &str) -> bool {
        let before = self.statuses.len();
        self.statuses.retain(|s| s != status);
        self.statuses.len() != before
    }

    /// Summed bonuses of every equipped item, enchantments included.
    pub fn equipment_totals(&self) -> StatBonuses {
        self.equipment.values().map(Item::total_stats).sum()
    }

    /// Armor class against enemy attacks.
    pub fn armor_class(&self) -> i32 {
        let shield = if self.has_status("shielded") { 5 } else { 0 };
        10 + self.skills.defense + self.equipment_totals().ac_bonus + shield
    }

    pub fn main_hand(&self) -> Option<&Item> {
        self.equipment.get(&EquipmentSlot::MainHand)
    }

    pub fn ability_state(&self, ability_id: &str) -> Option<&AbilityState> {
        self.abilities.iter().find(|a| a.ability_id == ability_id)
    }

    pub fn set_cooldown(&mut self, ability_id: &str, value: u32) {
        if let Some(state) = self.abilities.iter_mut().find(|a| a.ability_id == ability_id) {
            state.current_cooldown = value;
        }
    }

    /// Apply damage. Marks the actor dead at zero HP. Returns true on death.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.hp.take(amount) == 0 {
            self.is_alive = false;
        }
        !self.is_alive
    }
}

/// Build a fresh actor. Recruits also get their role's starter gear.
pub fn create_actor(
    id: impl Into<String>,
    name: impl Into<String>,
    role: Role,
    level: u32,
    include_starter_gear: bool,
) -> Actor {
    let level = level.max(1);
    let max_hp = classes::initial_hp(role) + (level as i32 - 1) * 4;

    let mut actor = Actor {
        id: id.into(),
        name: name.into(),
        role,
        level,
        xp: 0,
        stat_points: 0,
        skills: classes::starting_skills(role),
        hp: Pool::full(max_hp),
        stress: Pool::empty(20),
        hit_dice: HitDice {
            current: level,
            max: level,
            die: classes::hit_die(role),
        },
        is_alive: true,
        equipment: Equipment::new(),
        abilities: abilities::abilities_for_role(role)
            .map(|a| AbilityState {
                ability_id: a.id.to_string(),
                current_cooldown: 0,
            })
            .collect(),
        statuses: Vec::new(),
    };

    if include_starter_gear {
        for mut item in classes::starter_equipment(role) {
            item.id = format!("{}-{}", actor.id, item.id);
            let slot = EquipmentSlot::for_item(item.item_type, &actor.equipment);
            let bonus = item.total_stats().max_hp_bonus;
            actor.hp.max += bonus;
            actor.hp.current += bonus;
            actor.equipment.insert(slot, item);
        }
    }

    actor
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub members: Vec<Actor>,
    pub gold: u32,
}

impl Party {
    pub fn living(&self) -> impl Iterator<Item = &Actor> {
        self.members.iter().filter(|m| m.is_alive)
    }

    pub fn member(&self, id: &str) -> Option<&Actor> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn member_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn all_dead(&self) -> bool {
        self.members.iter().all(|m| !m.is_alive)
    }

    /// Whether a living member has the role.
    pub fn has_living(&self, role: Role) -> bool {
        self.living().any(|m| m.role == role)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub items: Vec<Item>,
}

impl Inventory {
    /// Remove and return an item by id.
    pub fn take(&mut self, item_id: &str) -> Option<Item> {
        let index = self.items.iter().position(|i| i.id == item_id)?;
        Some(self.items.remove(index))
    }
}

// ============================================================================
// Rooms
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Combat,
    Elite,
    Hazard,
    Trader,
    Shrine,
    Intermission,
    Boss,
}

impl RoomType {
    pub fn name(&self) -> &'static str {
        match self {
            RoomType::Combat => "combat",
            RoomType::Elite => "elite",
            RoomType::Hazard => "hazard",
            RoomType::Trader => "trader",
            RoomType::Shrine => "shrine",
            RoomType::Intermission => "intermission",
            RoomType::Boss => "boss",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A depth-scaled combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub max_hp: i32,
    pub power: i32,
    pub damage: String,
    pub ac: i32,
    pub xp: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attacks still skipped because of Turn Undead.
    #[serde(default)]
    pub turned_rounds: u32,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A mercenary on offer at an intermission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitOption {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub cost: u32,
    pub description: String,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub theme_id: String,
    #[serde(default)]
    pub enemies: Vec<Enemy>,
    #[serde(default)]
    pub loot: Vec<Item>,
    #[serde(default)]
    pub shop_items: Vec<Item>,
    #[serde(default)]
    pub available_recruits: Vec<RecruitOption>,
    #[serde(default)]
    pub boss_room: Option<Box<Room>>,
}

impl Room {
    pub fn new(id: impl Into<String>, room_type: RoomType, theme_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            room_type,
            theme_id: theme_id.into(),
            enemies: Vec::new(),
            loot: Vec::new(),
            shop_items: Vec::new(),
            available_recruits: Vec::new(),
            boss_room: None,
        }
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    pub fn has_living_enemies(&self) -> bool {
        self.living_enemies().next().is_some()
    }

    /// Whether entering this room starts a fight.
    pub fn is_combat(&self) -> bool {
        match self.room_type {
            RoomType::Combat | RoomType::Elite | RoomType::Boss => true,
            RoomType::Shrine | RoomType::Hazard => !self.enemies.is_empty(),
            _ => false,
        }
    }
}

// ============================================================================
// Run state
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatTurn {
    #[default]
    None,
    Player,
    Enemy,
}

/// The complete world snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub seed: String,
    pub depth: u32,
    pub theme_id: String,
    pub short_rests_remaining: u32,
    pub long_rests_taken: u32,
    pub party: Party,
    pub inventory: Inventory,
    pub current_room: Option<Room>,
    pub room_resolved: bool,
    #[serde(default)]
    pub combat_turn: CombatTurn,
    #[serde(default)]
    pub combat_round: u32,
    #[serde(default)]
    pub acted_this_round: Vec<String>,
    #[serde(default)]
    pub extra_actions: u32,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub victory: bool,
    #[serde(default)]
    pub shrine_boon: Option<String>,
    #[serde(default)]
    pub mutations: Vec<String>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub in_boss_room: bool,
    #[serde(default)]
    pub parent_intermission: Option<Room>,
    /// Counts randomness-consuming actions so each draws a fresh stream.
    #[serde(default)]
    pub rng_tick: u32,
    /// Counts template items turned into owned instances.
    #[serde(default)]
    pub items_minted: u32,
}

impl RunState {
    /// Append a log line, keeping only the newest [`HISTORY_LIMIT`].
    pub fn log(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    pub fn in_combat(&self) -> bool {
        self.combat_turn != CombatTurn::None
    }

    pub fn room_type(&self) -> Option<RoomType> {
        self.current_room.as_ref().map(|r| r.room_type)
    }

    pub fn room_has_living_enemies(&self) -> bool {
        self.current_room
            .as_ref()
            .is_some_and(Room::has_living_enemies)
    }

    /// Turn a catalog template into an owned item with a fresh id.
    pub fn mint_item(&mut self, template: &Item) -> Item {
        self.items_minted += 1;
        template.instantiate(format!("{}-{}", template.id, self.items_minted))
    }
}

/// A new run, standing before the starting shrine.
pub fn create_initial_run_state(seed: impl Into<String>) -> RunState {
    let mut hero = create_actor("hero-1", "Hero", Role::Fighter, 1, false);
    hero.equipment
        .insert(EquipmentSlot::MainHand, STARTER_SWORD.clone());

    RunState {
        seed: seed.into(),
        depth: 0,
        theme_id: themes::STARTING_THEME.to_string(),
        short_rests_remaining: SHORT_RESTS_PER_SEGMENT,
        long_rests_taken: 0,
        party: Party {
            members: vec![hero],
            gold: 0,
        },
        inventory: Inventory::default(),
        current_room: Some(Room::new(
            "room-0",
            RoomType::Shrine,
            themes::STARTING_THEME,
        )),
        room_resolved: false,
        combat_turn: CombatTurn::None,
        combat_round: 0,
        acted_this_round: Vec::new(),
        extra_actions: 0,
        game_over: false,
        victory: false,
        shrine_boon: None,
        mutations: Vec::new(),
        history: vec![
            "Run started.".to_string(),
            "You stand before an ancient shrine...".to_string(),
        ],
        in_boss_room: false,
        parent_intermission: None,
        rng_tick: 0,
        items_minted: 0,
    }
}
