//! Per-role starting numbers and gear.

use crate::items::{get_item, Item};
use crate::world::{Role, Skills};

/// Skills a fresh character of each role starts with.
pub fn starting_skills(role: Role) -> Skills {
    let [strength, attack, defense, magic, ranged, faith, agility] = match role {
        Role::Fighter => [2, 2, 1, 0, 0, 0, 1],
        Role::Wizard => [0, 0, 0, 3, 0, 0, 0],
        Role::Rogue => [0, 1, 0, 0, 2, 0, 3],
        Role::Cleric => [1, 0, 1, 0, 0, 3, 0],
        Role::Ranger => [0, 1, 0, 0, 3, 1, 2],
    };
    Skills {
        strength,
        attack,
        defense,
        magic,
        ranged,
        faith,
        agility,
    }
}

pub fn hit_die(role: Role) -> u32 {
    match role {
        Role::Fighter | Role::Ranger => 10,
        Role::Cleric | Role::Rogue => 8,
        Role::Wizard => 6,
    }
}

/// Max HP at level 1.
pub fn initial_hp(role: Role) -> i32 {
    match role {
        Role::Fighter => 12,
        Role::Wizard => 6,
        Role::Rogue => 8,
        Role::Cleric | Role::Ranger => 10,
    }
}

/// Common gear handed to recruits when they join.
pub fn starter_equipment(role: Role) -> Vec<Item> {
    let ids: &[&str] = match role {
        Role::Fighter => &["fighter_sword_common", "shield_common"],
        Role::Wizard => &["wizard_staff_common"],
        Role::Rogue => &["rogue_dagger_common", "rogue_armor_common"],
        Role::Cleric => &["cleric_mace_common", "cleric_armor_common"],
        Role::Ranger => &["ranger_bow_common", "ranger_armor_common"],
    };
    ids.iter().filter_map(|id| get_item(id)).cloned().collect()
}
