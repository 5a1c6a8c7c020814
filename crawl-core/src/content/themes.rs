//! Dungeon themes.
//!
//! A theme decides which enemy tags the generator prefers and supplies flavor
//! text. Themes only change at long-rest boundaries.

use crate::rng::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub enemy_tags: &'static [&'static str],
    pub trap_tags: &'static [&'static str],
    pub boss_pool: &'static [&'static str],
    pub ambiance: &'static [&'static str],
}

/// The theme every run starts in, and the fallback for unknown ids.
pub const STARTING_THEME: &str = "dungeon_start";

/// Theme catalog in selection order.
pub static THEMES: &[ThemeDef] = &[
    ThemeDef {
        id: "dungeon_start",
        name: "Ancient Sewers",
        description: "A damp, moss-covered sewer system beneath the city.",
        enemy_tags: &["vermin", "slime"],
        trap_tags: &["tripwire", "spikes"],
        boss_pool: &["sewer_king"],
        ambiance: &[
            "The smell of rot is overpowering.",
            "Scurrying sounds echo in the darkness.",
            "Slime drips from the ceiling.",
        ],
    },
    ThemeDef {
        id: "crypt",
        name: "Forgotten Crypt",
        description: "Rows of silent tombs line the walls.",
        enemy_tags: &["undead", "skeleton"],
        trap_tags: &["darts", "curse"],
        boss_pool: &["lich_acolyte"],
        ambiance: &[
            "A cold draft chills your bones.",
            "Dust motes dance in the torchlight.",
            "You feel watched by the statues.",
        ],
    },
];

/// Look up a theme, falling back to the starting theme.
pub fn theme_def(id: &str) -> &'static ThemeDef {
    THEMES
        .iter()
        .find(|t| t.id == id)
        .unwrap_or(&THEMES[0])
}

/// Pick a theme uniformly.
pub fn generate_theme<R: RandomSource>(rng: &mut R) -> &'static str {
    let index = rng.int(0, THEMES.len() as i32 - 1);
    THEMES[index as usize].id
}
