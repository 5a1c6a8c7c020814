//! Mercenaries for hire at intermissions.

use crate::world::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecruitDef {
    pub id: &'static str,
    pub name: &'static str,
    pub role: Role,
    pub cost: u32,
    pub description: &'static str,
}

pub static RECRUITS: &[RecruitDef] = &[
    RecruitDef {
        id: "recruit_fighter",
        name: "Sir Roland",
        role: Role::Fighter,
        cost: 30,
        description: "A veteran knight seeking glory.",
    },
    RecruitDef {
        id: "recruit_wizard",
        name: "Elara the Wise",
        role: Role::Wizard,
        cost: 40,
        description: "A scholar of the arcane arts.",
    },
    RecruitDef {
        id: "recruit_rogue",
        name: "Shadow",
        role: Role::Rogue,
        cost: 25,
        description: "A thief with quick reflexes.",
    },
    RecruitDef {
        id: "recruit_cleric",
        name: "Brother Marcus",
        role: Role::Cleric,
        cost: 35,
        description: "A holy man with healing touch.",
    },
    RecruitDef {
        id: "recruit_fighter2",
        name: "Greta the Strong",
        role: Role::Fighter,
        cost: 30,
        description: "A barbarian from the north.",
    },
    RecruitDef {
        id: "recruit_wizard2",
        name: "Merlin Jr.",
        role: Role::Wizard,
        cost: 45,
        description: "A prodigy of magical talent.",
    },
];

pub fn get_recruit(id: &str) -> Option<&'static RecruitDef> {
    RECRUITS.iter().find(|r| r.id == id)
}
