//! Class abilities.

use crate::world::Role;
use std::fmt;

/// Cooldown value meaning "until the next rest".
pub const UNTIL_REST: u32 = 999;

/// How an ability recharges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    /// Ready again after this many enemy turns.
    Turns(u32),
    /// Once per fight.
    Combat,
    /// Until a short or long rest.
    Rest,
}

impl Cooldown {
    /// The counter value stored on the actor after use.
    pub fn value(&self) -> u32 {
        match self {
            Cooldown::Turns(n) => *n,
            Cooldown::Combat => 1,
            Cooldown::Rest => UNTIL_REST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Damage,
    Attack,
    Heal,
    Buff,
    Debuff,
    Special,
}

impl EffectKind {
    pub fn is_offensive(&self) -> bool {
        matches!(self, EffectKind::Damage | EffectKind::Attack)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    SelfOnly,
    Ally,
    Enemy,
    AllEnemies,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityEffect {
    pub kind: EffectKind,
    pub target: EffectTarget,
    pub dice: Option<&'static str>,
    pub modifier: i32,
    pub status: Option<&'static str>,
    pub attack_bonus: i32,
    pub damage_bonus: i32,
}

impl AbilityEffect {
    const fn new(kind: EffectKind, target: EffectTarget) -> Self {
        Self {
            kind,
            target,
            dice: None,
            modifier: 0,
            status: None,
            attack_bonus: 0,
            damage_bonus: 0,
        }
    }

    const fn dice(mut self, dice: &'static str) -> Self {
        self.dice = Some(dice);
        self
    }

    const fn modifier(mut self, modifier: i32) -> Self {
        self.modifier = modifier;
        self
    }

    const fn status(mut self, status: &'static str) -> Self {
        self.status = Some(status);
        self
    }

    const fn bonuses(mut self, attack: i32, damage: i32) -> Self {
        self.attack_bonus = attack;
        self.damage_bonus = damage;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityDef {
    pub id: &'static str,
    pub name: &'static str,
    pub role: Role,
    pub description: &'static str,
    pub cooldown: Cooldown,
    pub effect: AbilityEffect,
    /// Usable only while the actor has this status.
    pub requires_status: Option<&'static str>,
    /// Does not spend the actor's action for the round.
    pub free_action: bool,
}

impl fmt::Display for AbilityDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn ability(
    id: &'static str,
    name: &'static str,
    role: Role,
    description: &'static str,
    cooldown: Cooldown,
    effect: AbilityEffect,
) -> AbilityDef {
    AbilityDef {
        id,
        name,
        role,
        description,
        cooldown,
        effect,
        requires_status: None,
        free_action: false,
    }
}

const fn requires(mut def: AbilityDef, status: &'static str) -> AbilityDef {
    def.requires_status = Some(status);
    def
}

const fn free(mut def: AbilityDef) -> AbilityDef {
    def.free_action = true;
    def
}

use EffectKind as K;
use EffectTarget as T;

pub static ABILITIES: &[AbilityDef] = &[
    // Fighter
    ability(
        "second_wind",
        "Second Wind",
        Role::Fighter,
        "Heal 1d10+level HP",
        Cooldown::Rest,
        AbilityEffect::new(K::Heal, T::SelfOnly).dice("1d10"),
    ),
    free(ability(
        "action_surge",
        "Action Surge",
        Role::Fighter,
        "Take an extra attack this turn",
        Cooldown::Rest,
        AbilityEffect::new(K::Special, T::SelfOnly),
    )),
    ability(
        "champion_strike",
        "Champion Strike",
        Role::Fighter,
        "+2d6 damage on next hit",
        Cooldown::Turns(3),
        AbilityEffect::new(K::Buff, T::SelfOnly)
            .status("champion_strike")
            .dice("2d6"),
    ),
    // Wizard
    ability(
        "magic_missile",
        "Magic Missile",
        Role::Wizard,
        "3d4+3 force damage",
        Cooldown::Turns(2),
        AbilityEffect::new(K::Damage, T::Enemy).dice("3d4").modifier(3),
    ),
    ability(
        "fireball",
        "Fireball",
        Role::Wizard,
        "6d6 fire damage to all enemies",
        Cooldown::Rest,
        AbilityEffect::new(K::Damage, T::AllEnemies).dice("6d6"),
    ),
    ability(
        "shield",
        "Shield",
        Role::Wizard,
        "+5 AC until next turn",
        Cooldown::Combat,
        AbilityEffect::new(K::Buff, T::SelfOnly)
            .status("shielded")
            .modifier(5),
    ),
    // Cleric
    ability(
        "healing_word",
        "Healing Word",
        Role::Cleric,
        "Heal ally 1d8+level",
        Cooldown::Turns(2),
        AbilityEffect::new(K::Heal, T::Ally).dice("1d8"),
    ),
    ability(
        "sacred_flame",
        "Sacred Flame",
        Role::Cleric,
        "1d8 radiant damage",
        Cooldown::Turns(0),
        AbilityEffect::new(K::Damage, T::Enemy).dice("1d8"),
    ),
    ability(
        "turn_undead",
        "Turn Undead",
        Role::Cleric,
        "Fear undead enemies for 2 turns",
        Cooldown::Rest,
        AbilityEffect::new(K::Debuff, T::AllEnemies).modifier(2),
    ),
    // Rogue
    requires(
        ability(
            "sneak_attack",
            "Sneak Attack",
            Role::Rogue,
            "+2d6 damage (Requires Hidden)",
            Cooldown::Combat,
            AbilityEffect::new(K::Damage, T::Enemy).dice("2d6"),
        ),
        "hidden",
    ),
    free(ability(
        "cunning_action",
        "Cunning Action",
        Role::Rogue,
        "Hide - Become untargetable",
        Cooldown::Turns(0),
        AbilityEffect::new(K::Special, T::SelfOnly).status("hidden"),
    )),
    ability(
        "evasion",
        "Evasion",
        Role::Rogue,
        "Dodge one attack completely",
        Cooldown::Rest,
        AbilityEffect::new(K::Special, T::SelfOnly).status("evasion"),
    ),
    // Ranger
    ability(
        "aimed_shot",
        "Aimed Shot",
        Role::Ranger,
        "High accuracy ranged attack",
        Cooldown::Turns(2),
        AbilityEffect::new(K::Attack, T::Enemy).bonuses(5, 2),
    ),
    ability(
        "volley",
        "Volley",
        Role::Ranger,
        "Attack all enemies with ranged damage",
        Cooldown::Rest,
        AbilityEffect::new(K::Special, T::AllEnemies).dice("1d6"),
    ),
    free(ability(
        "camouflage",
        "Camouflage",
        Role::Ranger,
        "Become Hidden (Stealth)",
        Cooldown::Combat,
        AbilityEffect::new(K::Buff, T::SelfOnly).status("hidden"),
    )),
];

pub fn get_ability(id: &str) -> Option<&'static AbilityDef> {
    ABILITIES.iter().find(|a| a.id == id)
}

pub fn abilities_for_role(role: Role) -> impl Iterator<Item = &'static AbilityDef> {
    ABILITIES.iter().filter(move |a| a.role == role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceExpression;

    #[test]
    fn test_three_abilities_per_role() {
        for role in Role::ALL {
            assert_eq!(abilities_for_role(role).count(), 3, "{role}");
        }
    }

    #[test]
    fn test_ability_dice_parse() {
        for def in ABILITIES {
            if let Some(dice) = def.effect.dice {
                assert!(DiceExpression::parse(dice).is_ok(), "{}", def.id);
            }
        }
    }

    #[test]
    fn test_cooldown_values() {
        assert_eq!(get_ability("fireball").unwrap().cooldown.value(), UNTIL_REST);
        assert_eq!(get_ability("shield").unwrap().cooldown.value(), 1);
        assert_eq!(get_ability("magic_missile").unwrap().cooldown.value(), 2);
        assert_eq!(get_ability("sneak_attack").unwrap().requires_status, Some("hidden"));
    }
}
