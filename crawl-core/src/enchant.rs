//! Enchantments: tier rolls, effects, naming and stacking.
//!
//! Shrines, boss rewards and godly drops all funnel through
//! [`apply_enchantment`], so naming and stacking behave the same everywhere.

use crate::content::SuffixTable;
use crate::items::{Enchantment, Item, ItemType, StatBonuses};
use crate::rng::RandomSource;
use crate::world::{Actor, EquipmentSlot};

/// Tier reserved for godly drops.
pub const GODLY_TIER: u8 = 6;

/// Highest tier a shrine can roll.
pub const MAX_SHRINE_TIER: u8 = 5;

pub fn tier_name(tier: u8) -> &'static str {
    match tier {
        0 | 1 => "Minor",
        2 => "Lesser",
        3 => "Greater",
        4 => "Epic",
        5 => "Legendary",
        _ => "Godly",
    }
}

/// Roll a shrine tier. Each point of faith shifts the percentile up by 5.
pub fn roll_tier<R: RandomSource>(faith: i32, rng: &mut R) -> u8 {
    let roll = rng.float() * 100.0 + (faith * 5) as f64;
    if roll < 50.0 {
        1
    } else if roll < 75.0 {
        2
    } else if roll < 90.0 {
        3
    } else if roll < 98.0 {
        4
    } else {
        5
    }
}

/// Tier for a boss reward: Greater or better.
pub fn roll_boss_tier<R: RandomSource>(rng: &mut R) -> u8 {
    let roll = rng.float() * 100.0;
    if roll < 60.0 {
        3
    } else if roll < 90.0 {
        4
    } else {
        5
    }
}

/// How an enchantment's bonus is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnchantCategory {
    Weapon,
    Shield,
    Armor,
    Jewelry,
}

impl EnchantCategory {
    /// Category for an item sitting in an equipment slot.
    pub fn for_slot(slot: EquipmentSlot, item_type: ItemType) -> Self {
        match slot {
            EquipmentSlot::MainHand | EquipmentSlot::OffHand => {
                if item_type == ItemType::Shield {
                    EnchantCategory::Shield
                } else {
                    EnchantCategory::Weapon
                }
            }
            EquipmentSlot::Head | EquipmentSlot::Chest | EquipmentSlot::Legs | EquipmentSlot::Feet => {
                EnchantCategory::Armor
            }
            EquipmentSlot::Neck | EquipmentSlot::Ring1 | EquipmentSlot::Ring2 => {
                EnchantCategory::Jewelry
            }
        }
    }

    /// Category for a loose item.
    pub fn for_item_type(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Weapon => EnchantCategory::Weapon,
            ItemType::Shield => EnchantCategory::Shield,
            ItemType::Head | ItemType::Chest | ItemType::Legs | ItemType::Feet => {
                EnchantCategory::Armor
            }
            ItemType::Neck | ItemType::Ring => EnchantCategory::Jewelry,
        }
    }

    pub fn suffixes(&self) -> SuffixTable {
        match self {
            EnchantCategory::Weapon => SuffixTable::Weapon,
            EnchantCategory::Shield | EnchantCategory::Armor => SuffixTable::Armor,
            EnchantCategory::Jewelry => SuffixTable::Trinket,
        }
    }

    /// Stat deltas for a bonus value at a tier.
    fn effect<R: RandomSource>(&self, tier: u8, bonus: i32, rng: &mut R) -> StatBonuses {
        let tier = tier as i32;
        let none = StatBonuses::default();
        match self {
            EnchantCategory::Weapon => none.attack((bonus / 2).max(1)).damage(bonus),
            EnchantCategory::Shield => {
                let effect = none.ac(bonus);
                if tier >= 3 {
                    effect.max_hp(tier)
                } else {
                    effect
                }
            }
            EnchantCategory::Armor => {
                let effect = none.ac(bonus);
                if tier >= 3 {
                    effect.max_hp(tier * 2)
                } else {
                    effect
                }
            }
            EnchantCategory::Jewelry => {
                let roll = rng.float();
                if roll < 0.33 {
                    none.attack(bonus)
                } else if roll < 0.66 {
                    none.damage(bonus)
                } else {
                    none.max_hp(bonus * 2)
                }
            }
        }
    }
}

/// What an enchantment did, for log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnchantOutcome {
    pub tier: u8,
    pub tier_name: &'static str,
    pub bonus: i32,
    pub upgraded: bool,
    /// Display name before the enchantment.
    pub old_name: String,
    /// Display name after the enchantment.
    pub new_name: String,
    /// Change in the item's total max HP bonus.
    pub max_hp_delta: i32,
}

/// Strip an enchantment suffix from an item name.
pub fn base_name(name: &str) -> &str {
    let name = name.find(" of ").map_or(name, |i| &name[..i]);
    name.find(" God").map_or(name, |i| &name[..i])
}

/// Single-entry tiers take no draw.
fn pick_suffix<R: RandomSource>(names: &'static [&'static str], rng: &mut R) -> &'static str {
    match names {
        [] => "",
        [only] => *only,
        _ => {
            let index = rng.int(0, names.len() as i32 - 1) as usize;
            names[index.min(names.len() - 1)]
        }
    }
}

/// Put an enchantment of the given tier on an item.
///
/// When `upgrade` is set and the item is already enchanted, the new deltas
/// stack on the old ones. Otherwise the enchantment is replaced.
pub fn apply_enchantment<R: RandomSource>(
    item: &mut Item,
    category: EnchantCategory,
    tier: u8,
    upgrade: bool,
    rng: &mut R,
) -> EnchantOutcome {
    let tier = tier.clamp(1, GODLY_TIER);
    let name = tier_name(tier);
    let bonus = tier as i32 + (rng.float() * tier as f64).floor() as i32;
    let suffix = pick_suffix(category.suffixes().suffixes(tier), rng);
    let mut effect = category.effect(tier, bonus, rng);

    let hp_before = item.total_stats().max_hp_bonus;
    let old_name = item.display_name().to_string();
    let stacked = match (&item.enchantment, upgrade) {
        (Some(existing), true) => {
            effect = existing.effect + effect;
            true
        }
        _ => false,
    };

    let root = if item.enchantment.is_some() {
        base_name(&item.name).to_string()
    } else {
        item.name.clone()
    };
    item.name = format!("{root} {suffix}");
    item.enchantment = Some(Enchantment {
        tier,
        name: suffix.to_string(),
        description: format!("{name} Boon"),
        effect,
    });

    if stacked {
        item.push_history(format!("Stacked with {name} enchantment (Total Tier {tier})"));
    } else {
        item.push_history(format!("Blessed with {name} enchantment"));
    }

    EnchantOutcome {
        tier,
        tier_name: name,
        bonus,
        upgraded: stacked,
        old_name,
        new_name: item.display_name().to_string(),
        max_hp_delta: item.total_stats().max_hp_bonus - hp_before,
    }
}

/// A shrine blessing: roll the tier from faith, with a 50% upgrade branch
/// for items that already carry an enchantment.
pub fn bless_item<R: RandomSource>(
    item: &mut Item,
    category: EnchantCategory,
    faith: i32,
    rng: &mut R,
) -> EnchantOutcome {
    let existing_tier = item.enchantment.as_ref().map_or(0, |e| e.tier);
    let upgrade = existing_tier > 0 && rng.float() < 0.5;
    let rolled = roll_tier(faith, rng);
    let tier = if upgrade {
        rolled.max(existing_tier.saturating_add(1)).min(MAX_SHRINE_TIER)
    } else {
        rolled
    };
    apply_enchantment(item, category, tier, upgrade, rng)
}

/// Bless an equipped item and keep the wearer's HP in step with any change
/// to the item's max HP bonus.
pub fn bless_equipped<R: RandomSource>(
    actor: &mut Actor,
    slot: EquipmentSlot,
    rng: &mut R,
) -> Option<EnchantOutcome> {
    let faith = actor.skills.faith;
    let item = actor.equipment.get_mut(&slot)?;
    let category = EnchantCategory::for_slot(slot, item.item_type);
    let outcome = bless_item(item, category, faith, rng);
    adjust_max_hp(actor, outcome.max_hp_delta);
    Some(outcome)
}

/// Enchant an equipped item at a fixed tier, stacking on any existing one.
pub fn enchant_equipped_at<R: RandomSource>(
    actor: &mut Actor,
    slot: EquipmentSlot,
    tier: u8,
    rng: &mut R,
) -> Option<EnchantOutcome> {
    let item = actor.equipment.get_mut(&slot)?;
    let category = EnchantCategory::for_slot(slot, item.item_type);
    let outcome = apply_enchantment(item, category, tier, true, rng);
    adjust_max_hp(actor, outcome.max_hp_delta);
    Some(outcome)
}

/// Give a freshly dropped item its tier-6 enchantment.
pub fn make_godly<R: RandomSource>(item: &mut Item, rng: &mut R) -> EnchantOutcome {
    let category = EnchantCategory::for_item_type(item.item_type);
    apply_enchantment(item, category, GODLY_TIER, false, rng)
}

/// Raise or lower max HP by `delta`. Gains heal by the same amount; losses
/// never drop current HP below 1.
pub fn adjust_max_hp(actor: &mut Actor, delta: i32) {
    if delta > 0 {
        actor.hp.max += delta;
        actor.hp.current += delta;
    } else if delta < 0 {
        actor.hp.max = (actor.hp.max + delta).max(1);
        actor.hp.current = actor.hp.current.min(actor.hp.max).max(1);
    }
}
