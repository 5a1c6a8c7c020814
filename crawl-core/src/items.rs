//! Item model and the equipment catalog.
//!
//! Every piece of gear in the dungeon is built from a template in [`ITEMS`].
//! Templates are cloned and given a fresh instance id when they drop or are
//! bought, so two copies of the same sword never share an id.

use crate::rng::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Model
// ============================================================================

/// What kind of gear an item is. Decides which slot it fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weapon,
    Shield,
    Head,
    Chest,
    Legs,
    Feet,
    Neck,
    Ring,
}

impl ItemType {
    pub fn name(&self) -> &'static str {
        match self {
            ItemType::Weapon => "weapon",
            ItemType::Shield => "shield",
            ItemType::Head => "head",
            ItemType::Chest => "chest",
            ItemType::Legs => "legs",
            ItemType::Feet => "feet",
            ItemType::Neck => "neck",
            ItemType::Ring => "ring",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Godly,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Godly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Godly => "godly",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a weapon delivers damage. Picks the skills that govern an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Melee,
    Ranged,
    Magic,
}

impl WeaponKind {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponKind::Melee => "melee",
            WeaponKind::Ranged => "ranged",
            WeaponKind::Magic => "magic",
        }
    }

    /// Guess the kind from a weapon name, for items saved without one.
    pub fn infer(weapon_name: &str) -> WeaponKind {
        let lower = weapon_name.to_lowercase();
        if ["bow", "crossbow", "sling"].iter().any(|k| lower.contains(k)) {
            WeaponKind::Ranged
        } else if ["staff", "wand", "tome"].iter().any(|k| lower.contains(k)) {
            WeaponKind::Magic
        } else {
            WeaponKind::Melee
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Flat bonuses granted by an item or an enchantment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBonuses {
    #[serde(default)]
    pub attack_bonus: i32,
    #[serde(default)]
    pub damage_bonus: i32,
    #[serde(default)]
    pub ac_bonus: i32,
    #[serde(default)]
    pub max_hp_bonus: i32,
}

impl StatBonuses {
    pub fn attack(mut self, value: i32) -> Self {
        self.attack_bonus = value;
        self
    }

    pub fn damage(mut self, value: i32) -> Self {
        self.damage_bonus = value;
        self
    }

    pub fn ac(mut self, value: i32) -> Self {
        self.ac_bonus = value;
        self
    }

    pub fn max_hp(mut self, value: i32) -> Self {
        self.max_hp_bonus = value;
        self
    }
}

impl std::ops::Add for StatBonuses {
    type Output = StatBonuses;

    fn add(self, rhs: StatBonuses) -> StatBonuses {
        StatBonuses {
            attack_bonus: self.attack_bonus + rhs.attack_bonus,
            damage_bonus: self.damage_bonus + rhs.damage_bonus,
            ac_bonus: self.ac_bonus + rhs.ac_bonus,
            max_hp_bonus: self.max_hp_bonus + rhs.max_hp_bonus,
        }
    }
}

impl std::iter::Sum for StatBonuses {
    fn sum<I: Iterator<Item = StatBonuses>>(iter: I) -> StatBonuses {
        iter.fold(StatBonuses::default(), |acc, s| acc + s)
    }
}

/// A magical bonus layered on top of an item's base stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enchantment {
    /// 1 (Minor) through 5 (Legendary). Tier 6 only appears on godly drops.
    pub tier: u8,
    pub name: String,
    pub description: String,
    pub effect: StatBonuses,
}

/// Lifetime combat counters, accumulated while the item is equipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryStats {
    pub kills: u32,
    pub damage_dealt: u32,
    pub highest_hit: u32,
    pub critical_hits: u32,
    pub encounters_used: u32,
}

/// Maximum entries kept in an item's history log.
pub const ITEM_HISTORY_LIMIT: usize = 10;

/// A piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub cost: u32,
    pub base_stats: StatBonuses,
    #[serde(default)]
    pub weapon_kind: Option<WeaponKind>,
    #[serde(default)]
    pub enchantment: Option<Enchantment>,
    #[serde(default)]
    pub stats: MasteryStats,
    #[serde(default)]
    pub history: Vec<String>,
}

impl Item {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        item_type: ItemType,
        rarity: Rarity,
        cost: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            custom_name: None,
            item_type,
            rarity,
            cost,
            base_stats: StatBonuses::default(),
            weapon_kind: None,
            enchantment: None,
            stats: MasteryStats::default(),
            history: Vec::new(),
        }
    }

    pub fn with_attack(mut self, value: i32) -> Self {
        self.base_stats.attack_bonus = value;
        self
    }

    pub fn with_damage(mut self, value: i32) -> Self {
        self.base_stats.damage_bonus = value;
        self
    }

    pub fn with_ac(mut self, value: i32) -> Self {
        self.base_stats.ac_bonus = value;
        self
    }

    pub fn with_max_hp(mut self, value: i32) -> Self {
        self.base_stats.max_hp_bonus = value;
        self
    }

    pub fn with_kind(mut self, kind: WeaponKind) -> Self {
        self.weapon_kind = Some(kind);
        self
    }

    pub fn with_enchantment(mut self, enchantment: Enchantment) -> Self {
        self.enchantment = Some(enchantment);
        self
    }

    /// Base stats plus any enchantment.
    pub fn total_stats(&self) -> StatBonuses {
        match &self.enchantment {
            Some(e) => self.base_stats + e.effect,
            None => self.base_stats,
        }
    }

    /// The player's chosen name if any, otherwise the item's own name.
    pub fn display_name(&self) -> &str {
        self.custom_name.as_deref().unwrap_or(&self.name)
    }

    /// The explicit weapon kind, or one inferred from the name.
    pub fn effective_weapon_kind(&self) -> WeaponKind {
        self.weapon_kind
            .unwrap_or_else(|| WeaponKind::infer(&self.name))
    }

    /// Append to the history log, dropping the oldest entry past the cap.
    pub fn push_history(&mut self, entry: impl Into<String>) {
        self.history.push(entry.into());
        if self.history.len() > ITEM_HISTORY_LIMIT {
            let excess = self.history.len() - ITEM_HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    /// Copy of this template with a new instance id.
    pub fn instantiate(&self, instance_id: impl Into<String>) -> Item {
        let mut item = self.clone();
        item.id = instance_id.into();
        item
    }

    /// Record a landed hit in the item's mastery stats.
    pub fn record_hit(&mut self, damage: i32, kill: Option<&str>, critical: bool) {
        let damage = damage.max(0) as u32;
        let previous_best = self.stats.highest_hit;

        self.stats.damage_dealt += damage;
        self.stats.highest_hit = previous_best.max(damage);
        if critical {
            self.stats.critical_hits += 1;
        }
        if kill.is_some() {
            self.stats.kills += 1;
        }

        if let Some(enemy_name) = kill {
            self.push_history(format!("Slew {enemy_name}"));
        }
        if damage > previous_best && damage >= 10 {
            self.push_history(format!("New record hit: {damage} damage!"));
        }
        if critical {
            self.push_history("Critical strike!");
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Get a catalog item by id.
pub fn get_item(id: &str) -> Option<&'static Item> {
    ITEMS.iter().find(|i| i.id == id)
}

/// All catalog items of the given rarities, in catalog order.
pub fn items_of_rarity(rarities: &[Rarity]) -> Vec<&'static Item> {
    ITEMS.iter().filter(|i| rarities.contains(&i.rarity)).collect()
}

/// A tiered catalog line: one item per rarity from common to godly.
struct Line {
    prefix: &'static str,
    item_type: ItemType,
    kind: Option<WeaponKind>,
}

fn line_items(line: Line, entries: [(&'static str, u32, StatBonuses); 6]) -> Vec<Item> {
    Rarity::ALL
        .iter()
        .zip(entries)
        .map(|(rarity, (name, cost, stats))| {
            let mut item = Item::new(
                format!("{}_{}", line.prefix, rarity.name()),
                name,
                line.item_type,
                *rarity,
                cost,
            );
            item.base_stats = stats;
            item.weapon_kind = line.kind;
            item
        })
        .collect()
}

fn s() -> StatBonuses {
    StatBonuses::default()
}

fn weapon(prefix: &'static str, kind: WeaponKind) -> Line {
    Line {
        prefix,
        item_type: ItemType::Weapon,
        kind: Some(kind),
    }
}

fn gear(prefix: &'static str, item_type: ItemType) -> Line {
    Line {
        prefix,
        item_type,
        kind: None,
    }
}

lazy_static::lazy_static! {
    /// Every equipment template, grouped by class line then universal slots.
    pub static ref ITEMS: Vec<Item> = {
        let mut items = Vec::new();

        // Fighter
        items.extend(line_items(weapon("fighter_sword", WeaponKind::Melee), [
            ("Iron Sword", 15, s().attack(1).damage(1)),
            ("Steel Longsword", 35, s().attack(2).damage(2)),
            ("Knight's Blade", 70, s().attack(3).damage(3)),
            ("Dragonslayer", 140, s().attack(4).damage(4)),
            ("Excalibur", 280, s().attack(5).damage(5)),
            ("Godsteel Blade", 600, s().attack(7).damage(7)),
        ]));
        items.extend(line_items(gear("fighter_armor", ItemType::Chest), [
            ("Chainmail", 20, s().ac(1)),
            ("Plate Armor", 45, s().ac(2).max_hp(2)),
            ("Crusader Plate", 90, s().ac(3).max_hp(4)),
            ("Dragon Scale", 180, s().ac(4).max_hp(6)),
            ("Titan's Aegis", 350, s().ac(5).max_hp(8)),
            ("Armor of the Valkyrie", 700, s().ac(7).max_hp(12)),
        ]));

        // Wizard
        items.extend(line_items(weapon("wizard_staff", WeaponKind::Magic), [
            ("Oak Staff", 12, s().attack(2)),
            ("Arcane Staff", 30, s().attack(3).damage(1)),
            ("Staff of Flames", 65, s().attack(4).damage(2)),
            ("Voidwalker Staff", 130, s().attack(5).damage(3)),
            ("Staff of Infinite Power", 260, s().attack(6).damage(4)),
            ("Cosmic Conduit", 550, s().attack(8).damage(6)),
        ]));
        items.extend(line_items(gear("wizard_robe", ItemType::Chest), [
            ("Apprentice Robe", 15, s().max_hp(2)),
            ("Mage Robe", 35, s().max_hp(4).attack(1)),
            ("Archmage Vestments", 75, s().max_hp(6).attack(2)),
            ("Ethereal Robe", 150, s().max_hp(8).attack(3)),
            ("Robe of the Arcane", 300, s().max_hp(10).attack(4)),
            ("Astral Vestments", 650, s().max_hp(15).attack(6)),
        ]));

        // Rogue
        items.extend(line_items(weapon("rogue_dagger", WeaponKind::Melee), [
            ("Sharp Dagger", 12, s().attack(1).damage(1)),
            ("Assassin Blade", 32, s().attack(2).damage(2)),
            ("Shadowstrike", 68, s().attack(3).damage(3)),
            ("Venom Fang", 135, s().attack(4).damage(4)),
            ("Deathwhisper", 270, s().attack(5).damage(5)),
            ("Midnight Edge", 580, s().attack(7).damage(7)),
        ]));
        items.extend(line_items(gear("rogue_armor", ItemType::Chest), [
            ("Leather Vest", 18, s().ac(1)),
            ("Thieves' Garb", 40, s().ac(2)),
            ("Nightstalker Leather", 85, s().ac(3).attack(1)),
            ("Assassin's Shroud", 170, s().ac(4).attack(2)),
            ("Shadow Walker Armor", 340, s().ac(5).attack(3)),
            ("Cloak of Invisibility", 680, s().ac(7).attack(5)),
        ]));

        // Cleric
        items.extend(line_items(weapon("cleric_mace", WeaponKind::Melee), [
            ("Holy Mace", 15, s().attack(1).damage(1)),
            ("Blessed Hammer", 35, s().attack(2).damage(2)),
            ("Divine Scepter", 72, s().attack(3).damage(3)),
            ("Judgment", 145, s().attack(4).damage(4)),
            ("Hand of God", 290, s().attack(5).damage(5)),
            ("Heaven's Wrath", 620, s().attack(7).damage(7)),
        ]));
        items.extend(line_items(gear("cleric_armor", ItemType::Chest), [
            ("Clerical Robe", 18, s().max_hp(3)),
            ("Priest Vestments", 42, s().max_hp(5).ac(1)),
            ("Holy Raiment", 88, s().max_hp(7).ac(2)),
            ("Blessed Plate", 175, s().max_hp(9).ac(3)),
            ("Divine Aegis", 360, s().max_hp(12).ac(4)),
            ("Celestial Vestments", 720, s().max_hp(18).ac(6)),
        ]));

        // Ranger
        items.extend(line_items(weapon("ranger_bow", WeaponKind::Ranged), [
            ("Short Bow", 14, s().attack(2)),
            ("Longbow", 34, s().attack(3).damage(1)),
            ("Elven Bow", 70, s().attack(4).damage(2)),
            ("Windpiercer", 140, s().attack(5).damage(3)),
            ("Heartseeker", 280, s().attack(6).damage(4)),
            ("Star Shot", 600, s().attack(8).damage(6)),
        ]));
        items.extend(line_items(gear("ranger_armor", ItemType::Chest), [
            ("Ranger Cloak", 16, s().ac(1)),
            ("Hunter's Mail", 38, s().ac(2)),
            ("Woodland Armor", 80, s().ac(3).attack(1)),
            ("Beast Hunter Gear", 160, s().ac(4).attack(2)),
            ("Nature's Warden", 320, s().ac(5).attack(3)),
            ("Avatar of the Wild", 660, s().ac(7).attack(5)),
        ]));

        // Universal slots
        items.extend(line_items(gear("helm", ItemType::Head), [
            ("Iron Helm", 15, s().ac(1)),
            ("Steel Helm", 35, s().ac(2)),
            ("Knight's Helm", 70, s().ac(3)),
            ("Dragon Helm", 140, s().ac(4).max_hp(4)),
            ("Crown of Kings", 280, s().ac(5).max_hp(6)),
            ("Halo of Divinity", 580, s().ac(7).max_hp(10)),
        ]));
        items.extend(line_items(gear("shield", ItemType::Shield), [
            ("Wooden Shield", 15, s().ac(1)),
            ("Iron Shield", 35, s().ac(2)),
            ("Tower Shield", 72, s().ac(3).max_hp(2)),
            ("Aegis", 145, s().ac(4).max_hp(4)),
            ("Bulwark", 290, s().ac(5).max_hp(6)),
            ("Shield of the Gods", 600, s().ac(7).max_hp(10)),
        ]));
        items.extend(line_items(gear("ring", ItemType::Ring), [
            ("Ring of Vigor", 18, s().max_hp(2)),
            ("Ring of Power", 40, s().max_hp(4).damage(1)),
            ("Ring of Mastery", 85, s().max_hp(6).damage(2)),
            ("Ring of Legends", 170, s().max_hp(8).damage(3).attack(1)),
            ("Ring of Eternity", 340, s().max_hp(10).damage(4).attack(2)),
            ("Godring", 700, s().max_hp(15).damage(6).attack(4)),
        ]));
        items.extend(line_items(gear("neck", ItemType::Neck), [
            ("Lucky Charm", 15, s().attack(1)),
            ("Amulet of Strength", 38, s().attack(1).damage(2)),
            ("Amulet of Power", 78, s().attack(2).damage(3)),
            ("Heart of the Dragon", 160, s().attack(3).damage(4).max_hp(4)),
            ("Star of Souls", 320, s().attack(4).damage(5).max_hp(6)),
            ("Divine Pendant", 680, s().attack(6).damage(7).max_hp(10)),
        ]));
        items.extend(line_items(gear("boots", ItemType::Feet), [
            ("Leather Boots", 12, s().max_hp(2)),
            ("Iron Boots", 30, s().max_hp(4)),
            ("Boots of Speed", 65, s().max_hp(6).attack(1)),
            ("Boots of Flight", 130, s().max_hp(8).attack(2)),
            ("Winged Boots", 260, s().max_hp(10).attack(3)),
            ("Boots of the Cosmos", 550, s().max_hp(15).attack(5)),
        ]));
        items.extend(line_items(gear("legs", ItemType::Legs), [
            ("Leather Leggings", 14, s().ac(1)),
            ("Chain Leggings", 32, s().ac(2)),
            ("Plated Greaves", 68, s().ac(3).max_hp(2)),
            ("Dragon Greaves", 135, s().ac(4).max_hp(4)),
            ("Titan's Legguards", 270, s().ac(5).max_hp(6)),
            ("Celestial Greaves", 580, s().ac(7).max_hp(10)),
        ]));

        items
    };

    /// The hero's opening weapon. Not sold anywhere.
    pub static ref STARTER_SWORD: Item =
        Item::new("starter_sword", "Rusty Sword", ItemType::Weapon, Rarity::Common, 5)
            .with_damage(1);
}

// ============================================================================
// Drop tables
// ============================================================================

/// Which drop table a kill rolls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropTier {
    Low,
    Mid,
    High,
    Elite,
    Boss,
    Shrine,
}

/// Probability of the separate godly roll for high-tier sources.
pub const GODLY_DROP_CHANCE: f64 = 0.02;

impl DropTier {
    /// Tier for an ordinary enemy of the given power.
    pub fn for_power(power: i32) -> DropTier {
        if power <= 2 {
            DropTier::Low
        } else if power <= 4 {
            DropTier::Mid
        } else {
            DropTier::High
        }
    }

    pub fn chance(&self) -> f64 {
        match self {
            DropTier::Low => 0.08,
            DropTier::Mid => 0.12,
            DropTier::High => 0.15,
            DropTier::Elite => 0.25,
            DropTier::Boss => 0.50,
            DropTier::Shrine => 0.30,
        }
    }

    pub fn rarities(&self) -> &'static [Rarity] {
        match self {
            DropTier::Low => &[Rarity::Common],
            DropTier::Mid => &[Rarity::Common, Rarity::Uncommon],
            DropTier::High => &[Rarity::Uncommon, Rarity::Rare],
            DropTier::Elite => &[Rarity::Rare, Rarity::Epic],
            DropTier::Boss => &[Rarity::Epic, Rarity::Legendary],
            DropTier::Shrine => &[Rarity::Rare, Rarity::Epic, Rarity::Legendary],
        }
    }

    /// Whether the godly roll applies.
    pub fn is_high_tier(&self) -> bool {
        !matches!(self, DropTier::Low | DropTier::Mid)
    }

    /// The drop pool, grouped by rarity in pool order.
    pub fn pool(&self) -> Vec<&'static Item> {
        self.rarities()
            .iter()
            .flat_map(|r| items_of_rarity(&[*r]))
            .collect()
    }
}

/// Roll a template from the tier's table. `None` means nothing dropped.
///
/// The godly roll happens first for high-tier sources and reports itself
/// through the returned flag so the caller can attach the godly enchantment.
pub fn roll_drop<R: RandomSource>(tier: DropTier, rng: &mut R) -> Option<(&'static Item, bool)> {
    if tier.is_high_tier() && rng.float() < GODLY_DROP_CHANCE {
        let godly = items_of_rarity(&[Rarity::Godly]);
        let index = (rng.float() * godly.len() as f64) as usize;
        return godly.get(index).map(|item| (*item, true));
    }

    if rng.float() > tier.chance() {
        return None;
    }

    let pool = tier.pool();
    let index = (rng.float() * pool.len() as f64) as usize;
    pool.get(index).map(|item| (*item, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRolls;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(ITEMS.len(), 96);
        for rarity in Rarity::ALL {
            assert_eq!(items_of_rarity(&[rarity]).len(), 16, "{rarity}");
        }
    }

    #[test]
    fn test_get_item() {
        let sword = get_item("fighter_sword_common").unwrap();
        assert_eq!(sword.name, "Iron Sword");
        assert_eq!(sword.item_type, ItemType::Weapon);
        assert_eq!(sword.base_stats.attack_bonus, 1);
        assert_eq!(sword.weapon_kind, Some(WeaponKind::Melee));

        let boots = get_item("boots_legendary").unwrap();
        assert_eq!(boots.name, "Winged Boots");
        assert_eq!(boots.base_stats.max_hp_bonus, 10);
        assert!(get_item("nope").is_none());
    }

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<&str> = ITEMS.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), ITEMS.len());
    }

    #[test]
    fn test_weapon_kind_inference() {
        assert_eq!(WeaponKind::infer("Elven Bow"), WeaponKind::Ranged);
        assert_eq!(WeaponKind::infer("Heavy Crossbow"), WeaponKind::Ranged);
        assert_eq!(WeaponKind::infer("Oak Staff"), WeaponKind::Magic);
        assert_eq!(WeaponKind::infer("Tome of Ash"), WeaponKind::Magic);
        assert_eq!(WeaponKind::infer("Rusty Sword"), WeaponKind::Melee);
        // Explicit kind wins over the name.
        let odd = get_item("ranger_bow_epic").unwrap();
        assert_eq!(odd.name, "Windpiercer");
        assert_eq!(odd.effective_weapon_kind(), WeaponKind::Ranged);
    }

    #[test]
    fn test_total_stats_includes_enchantment() {
        let item = get_item("fighter_sword_rare").unwrap().clone().with_enchantment(Enchantment {
            tier: 2,
            name: "of Wounding".to_string(),
            description: "Lesser Boon".to_string(),
            effect: s().attack(1).damage(3),
        });
        let total = item.total_stats();
        assert_eq!(total.attack_bonus, 4);
        assert_eq!(total.damage_bonus, 6);
    }

    #[test]
    fn test_history_capped() {
        let mut item = STARTER_SWORD.clone();
        for i in 0..15 {
            item.push_history(format!("entry {i}"));
        }
        assert_eq!(item.history.len(), ITEM_HISTORY_LIMIT);
        assert_eq!(item.history[0], "entry 5");
    }

    #[test]
    fn test_record_hit_mastery() {
        let mut item = STARTER_SWORD.clone();
        item.record_hit(6, None, false);
        assert_eq!(item.stats.damage_dealt, 6);
        assert!(item.history.is_empty());

        item.record_hit(12, Some("Goblin"), true);
        assert_eq!(item.stats.kills, 1);
        assert_eq!(item.stats.highest_hit, 12);
        assert_eq!(item.stats.critical_hits, 1);
        assert_eq!(
            item.history,
            vec!["Slew Goblin", "New record hit: 12 damage!", "Critical strike!"]
        );
    }

    #[test]
    fn test_drop_tiers() {
        assert_eq!(DropTier::for_power(1), DropTier::Low);
        assert_eq!(DropTier::for_power(4), DropTier::Mid);
        assert_eq!(DropTier::for_power(9), DropTier::High);
        assert_eq!(DropTier::Mid.pool().len(), 32);
    }

    #[test]
    fn test_roll_drop_miss_and_hit() {
        // Low tier: no godly roll, chance roll 0.5 > 0.08 misses.
        let mut rolls = ScriptedRolls::new([]).with_floats([0.5]);
        assert!(roll_drop(DropTier::Low, &mut rolls).is_none());

        // Low tier hit picks index floor(0.0 * 16) = 0.
        let mut rolls = ScriptedRolls::new([]).with_floats([0.01, 0.0]);
        let (item, godly) = roll_drop(DropTier::Low, &mut rolls).unwrap();
        assert_eq!(item.id, "fighter_sword_common");
        assert!(!godly);
    }

    #[test]
    fn test_roll_drop_godly() {
        let mut rolls = ScriptedRolls::new([]).with_floats([0.01, 0.0]);
        let (item, godly) = roll_drop(DropTier::Elite, &mut rolls).unwrap();
        assert!(godly);
        assert_eq!(item.rarity, Rarity::Godly);
    }
}
