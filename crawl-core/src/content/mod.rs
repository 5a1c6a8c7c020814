//! Static content tables.
//!
//! Everything here is immutable data. Runtime state only ever holds copies.

pub mod abilities;
pub mod classes;
pub mod enemies;
pub mod recruits;
pub mod themes;

pub use abilities::{get_ability, AbilityDef, ABILITIES};
pub use enemies::{EnemyDef, ENEMIES};
pub use recruits::{get_recruit, RecruitDef, RECRUITS};
pub use themes::{generate_theme, theme_def, ThemeDef, THEMES};

use crate::world::RoomType;

/// Room-type weights for a position inside a segment (1..=10).
///
/// The first room of a segment is always a fight.
pub fn room_weights(room_in_segment: i32) -> Vec<(RoomType, i32)> {
    if room_in_segment == 1 {
        return vec![(RoomType::Combat, 10)];
    }

    let mut weights = vec![
        (RoomType::Combat, 50),
        (RoomType::Hazard, 20),
        (RoomType::Shrine, 10),
        (RoomType::Trader, 10),
    ];
    if room_in_segment > 5 {
        weights.push((RoomType::Elite, 10 + room_in_segment * 2));
    }
    weights
}

/// Enchantment suffix families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixTable {
    Weapon,
    Armor,
    Trinket,
}

const WEAPON_SUFFIXES: [&[&str]; 6] = [
    &["of Striking", "of the Blade", "of Sharpness"],
    &["of Might", "of Slaying", "of the Warrior"],
    &["of Fury", "of Destruction", "of the Champion"],
    &["of Annihilation", "of the Titan", "of Doom"],
    &["of the Gods", "of Legends", "Godslayer"],
    &["of the Apocalypse"],
];

const ARMOR_SUFFIXES: [&[&str]; 6] = [
    &["of Protection", "of Warding", "of the Guard"],
    &["of Defense", "of the Sentinel", "of Resilience"],
    &["of Fortitude", "of the Bulwark", "of Endurance"],
    &["of Invincibility", "of the Immortal", "of Iron Will"],
    &["of the Divine", "of Eternity", "Godshield"],
    &["of the Divine Aegis"],
];

const TRINKET_SUFFIXES: [&[&str]; 6] = [
    &["of Minor Power", "of the Apprentice", "of Focus"],
    &["of Enhancement", "of the Adept", "of Clarity"],
    &["of Mastery", "of the Sage", "of Potency"],
    &["of Supremacy", "of the Archmage", "of Domination"],
    &["of Omnipotence", "of the Infinite", "Godstone"],
    &["of the Gods"],
];

impl SuffixTable {
    /// Candidate suffixes for a tier, 1 through 6. Never empty.
    pub fn suffixes(&self, tier: u8) -> &'static [&'static str] {
        let table = match self {
            SuffixTable::Weapon => &WEAPON_SUFFIXES,
            SuffixTable::Armor => &ARMOR_SUFFIXES,
            SuffixTable::Trinket => &TRINKET_SUFFIXES,
        };
        table[(tier.clamp(1, 6) - 1) as usize]
    }
}

/// Run-long modifiers that may be rolled at a long rest.
pub const MUTATIONS: [&str; 4] = ["Darkness", "Fog", "Brittle Weapons", "Frenzied Enemies"];
