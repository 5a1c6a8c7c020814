//! Enemy templates.
//!
//! Listed in six power tiers. The generator scales these by depth; nothing
//! here is mutated at runtime.

/// A catalog enemy before depth scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyDef {
    pub id: &'static str,
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub power: i32,
    pub hp: i32,
    pub damage: &'static str,
}

impl EnemyDef {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

const fn enemy(
    id: &'static str,
    name: &'static str,
    tags: &'static [&'static str],
    power: i32,
    hp: i32,
    damage: &'static str,
) -> EnemyDef {
    EnemyDef {
        id,
        name,
        tags,
        power,
        hp,
        damage,
    }
}

pub static ENEMIES: &[EnemyDef] = &[
    // Tier 1
    enemy("rat_swarm", "Rat Swarm", &["vermin", "beast"], 1, 8, "1d4"),
    enemy("giant_rat", "Giant Rat", &["vermin", "beast"], 1, 6, "1d4"),
    enemy("kobold", "Kobold", &["humanoid", "kobold"], 1, 6, "1d4+1"),
    enemy("goblin", "Goblin", &["humanoid", "goblin"], 1, 7, "1d4+1"),
    enemy("slime", "Green Slime", &["slime", "ooze"], 2, 12, "1d6"),
    enemy("giant_spider", "Giant Spider", &["vermin", "beast"], 2, 10, "1d6"),
    enemy("stirge", "Stirge", &["vermin", "beast"], 1, 4, "1d4"),
    enemy("bandit", "Bandit", &["humanoid"], 2, 11, "1d6"),
    // Tier 2
    enemy("skeleton", "Skeleton Warrior", &["undead", "skeleton"], 3, 12, "1d6+1"),
    enemy("zombie", "Rotting Zombie", &["undead", "zombie"], 3, 14, "1d6"),
    enemy("dire_wolf", "Dire Wolf", &["beast"], 3, 15, "1d6+2"),
    enemy("hobgoblin", "Hobgoblin", &["humanoid", "goblin"], 3, 14, "1d8"),
    enemy("gnoll", "Gnoll Hunter", &["humanoid", "gnoll"], 3, 16, "1d8"),
    enemy("cultist", "Dark Cultist", &["humanoid", "magic"], 3, 10, "1d8"),
    enemy("bugbear", "Bugbear", &["humanoid", "goblin"], 4, 18, "1d8+1"),
    enemy("harpy", "Harpy", &["monstrosity", "flying"], 4, 14, "1d6+2"),
    // Tier 3
    enemy("orc", "Orc Berserker", &["humanoid", "orc"], 5, 18, "1d8+2"),
    enemy("ghoul", "Ghoul", &["undead"], 5, 16, "1d8+1"),
    enemy("wight", "Wight", &["undead"], 5, 20, "1d10"),
    enemy("owlbear", "Owlbear", &["beast", "monstrosity"], 5, 22, "1d10+2"),
    enemy("minotaur", "Minotaur", &["monstrosity"], 6, 28, "2d6"),
    enemy("werewolf", "Werewolf", &["humanoid", "shapechanger"], 6, 24, "1d10+2"),
    enemy("troll", "Troll", &["giant"], 6, 30, "2d6+2"),
    enemy("wraith", "Wraith", &["undead", "incorporeal"], 6, 18, "1d10+2"),
    // Tier 4
    enemy("ogre", "Ogre", &["giant"], 7, 32, "2d6+2"),
    enemy("ettin", "Ettin", &["giant"], 7, 36, "2d8"),
    enemy("vampire_spawn", "Vampire Spawn", &["undead", "vampire"], 7, 28, "1d10+3"),
    enemy("manticore", "Manticore", &["monstrosity", "flying"], 7, 30, "2d6+2"),
    enemy("hill_giant", "Hill Giant", &["giant"], 8, 45, "2d8+3"),
    enemy("flesh_golem", "Flesh Golem", &["construct"], 8, 40, "2d8+2"),
    enemy("chimera", "Chimera", &["monstrosity", "flying"], 8, 38, "2d8+2"),
    enemy("oni", "Oni", &["giant", "magic"], 8, 35, "2d8+3"),
    // Tier 5
    enemy("frost_giant", "Frost Giant", &["giant"], 9, 55, "3d6+4"),
    enemy("fire_giant", "Fire Giant", &["giant"], 9, 50, "3d6+4"),
    enemy("young_dragon", "Young Dragon", &["dragon", "flying"], 9, 48, "2d10+3"),
    enemy("beholder_zombie", "Beholder Zombie", &["undead", "aberration"], 9, 40, "2d10"),
    enemy("mind_flayer", "Mind Flayer", &["aberration", "magic"], 10, 42, "2d10+4"),
    enemy("death_knight", "Death Knight", &["undead", "knight"], 10, 60, "2d10+5"),
    enemy("stone_giant", "Stone Giant", &["giant"], 10, 65, "3d8+4"),
    // Tier 6
    enemy("adult_dragon", "Adult Dragon", &["dragon", "flying", "boss"], 12, 120, "3d10+6"),
    enemy("lich", "Lich", &["undead", "magic", "boss"], 12, 80, "3d8+6"),
    enemy("vampire_lord", "Vampire Lord", &["undead", "vampire", "boss"], 11, 85, "2d12+5"),
    enemy("beholder", "Beholder", &["aberration", "boss"], 11, 75, "2d10+5"),
    enemy("demon_lord", "Demon Lord", &["fiend", "demon", "boss"], 13, 100, "3d10+8"),
    enemy("storm_giant", "Storm Giant", &["giant", "boss"], 12, 110, "3d10+6"),
];

pub fn get_enemy(id: &str) -> Option<&'static EnemyDef> {
    ENEMIES.iter().find(|e| e.id == id)
}
