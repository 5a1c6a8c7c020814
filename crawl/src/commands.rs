//! Turns protocol lines into actions.

use crawl_core::world::{EquipmentSlot, RunState, Skill};
use crawl_core::Action;

pub const ACTION_HELP: &[(&str, &str)] = &[
    ("start <seed>", "Start a new run"),
    ("advance", "Go to the next room"),
    ("resolve", "Settle the room in one contest"),
    ("short [actor...]", "Short rest (everyone by default)"),
    ("long", "Long rest"),
    ("attack [actor] <target>", "Basic attack"),
    ("ability <actor> <ability> [target]", "Use an ability"),
    ("escape", "Try to flee the fight"),
    ("disarm | trigger", "Deal with a trap"),
    ("pray", "Pray at a shrine"),
    ("dismiss", "Clear the victory/boon popup"),
    ("buy <item> [cost]", "Buy from the trader"),
    ("sell <item>", "Sell an inventory item"),
    ("equip <actor> <item> [slot]", "Equip an inventory item"),
    ("unequip <actor> <slot>", "Move an equipped item to the inventory"),
    ("hire <recruit>", "Hire a recruit"),
    ("rename <item> <name...>", "Rename an item (empty clears)"),
    ("stat <actor> <stat>", "Spend a stat point"),
    ("boss", "Enter the boss chamber"),
];

/// Parse one action line. The state fills in defaults such as the acting
/// party member.
pub fn parse_action(line: &str, state: &RunState) -> Result<Action, String> {
    let line = line.trim().trim_start_matches('>').trim();
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or("empty command")?.to_lowercase();
    let args: Vec<&str> = parts.collect();

    let arg = |i: usize, what: &str| -> Result<String, String> {
        args.get(i)
            .map(|s| s.to_string())
            .ok_or_else(|| format!("{verb}: missing {what}"))
    };

    let action = match verb.as_str() {
        "start" => Action::StartRun {
            seed: arg(0, "seed")?,
        },
        "advance" | "next" => Action::AdvanceRoom,
        "resolve" => Action::ResolveRoom,
        "short" => {
            let actor_ids = if args.is_empty() {
                state.party.living().map(|m| m.id.clone()).collect()
            } else {
                args.iter().map(|s| s.to_string()).collect()
            };
            Action::TakeShortRest { actor_ids }
        }
        "long" => Action::TakeLongRest,
        "attack" => match args.as_slice() {
            [target] => Action::Attack {
                attacker_id: default_actor(state)?,
                target_id: target.to_string(),
            },
            [attacker, target] => Action::Attack {
                attacker_id: attacker.to_string(),
                target_id: target.to_string(),
            },
            _ => return Err("usage: attack [actor] <target>".to_string()),
        },
        "ability" => Action::UseAbility {
            actor_id: arg(0, "actor")?,
            ability_id: arg(1, "ability")?,
            target_id: args.get(2).map(|s| s.to_string()),
        },
        "escape" | "flee" => Action::Escape,
        "disarm" => Action::DisarmTrap,
        "trigger" => Action::TriggerTrap,
        "pray" => Action::PrayAtShrine,
        "dismiss" => Action::DismissPopup,
        "buy" => Action::BuyItem {
            item_id: arg(0, "item")?,
            cost: match args.get(1) {
                Some(raw) => raw.parse().map_err(|_| format!("invalid cost: {raw}"))?,
                None => 0,
            },
        },
        "sell" => Action::SellItem {
            item_id: arg(0, "item")?,
        },
        "equip" => Action::EquipItem {
            actor_id: arg(0, "actor")?,
            item_id: arg(1, "item")?,
            slot: args.get(2).map(|s| s.parse::<EquipmentSlot>()).transpose()?,
        },
        "unequip" => Action::UnequipItem {
            actor_id: arg(0, "actor")?,
            slot: arg(1, "slot")?.parse()?,
        },
        "hire" => Action::HireRecruit {
            recruit_id: arg(0, "recruit")?,
        },
        "rename" => Action::RenameItem {
            item_id: arg(0, "item")?,
            new_name: args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default(),
        },
        "stat" => Action::SpendStatPoint {
            actor_id: arg(0, "actor")?,
            stat: arg(1, "stat")?.parse::<Skill>()?,
        },
        "boss" => Action::EnterBossRoom,
        other => return Err(format!("unknown action: {other}")),
    };
    Ok(action)
}

/// The first living member who has not acted this round.
fn default_actor(state: &RunState) -> Result<String, String> {
    let first = state
        .party
        .living()
        .find(|m| !state.acted_this_round.contains(&m.id))
        .or_else(|| state.party.living().next())
        .ok_or("no living party member")?;
    Ok(first.id.clone())
}
