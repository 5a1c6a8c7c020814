//! Shopping, gear, recruits and character upkeep.

use crate::content::recruits::get_recruit;
use crate::enchant::adjust_max_hp;
use crate::items::{get_item, ItemType};
use crate::world::{create_actor, EquipmentSlot, RecruitOption, RunState, Skill, MAX_PARTY_SIZE};
use tracing::{debug, warn};

/// Flat price a trader pays for any item.
pub const SELL_PRICE: u32 = 10;

/// Buy from the room's shop, or from the catalog when the shop lacks it.
///
/// The charge is the larger of the offered price and the item's list cost.
pub fn buy_item(state: &mut RunState, item_id: &str, cost: u32) {
    if state.in_combat() {
        return;
    }

    let shop_index = state
        .current_room
        .as_ref()
        .and_then(|r| r.shop_items.iter().position(|i| i.id == item_id));
    let template = match shop_index {
        Some(index) => state
            .current_room
            .as_ref()
            .and_then(|r| r.shop_items.get(index))
            .cloned(),
        None => get_item(item_id).cloned(),
    };
    let Some(template) = template else {
        warn!(item_id, "unknown item");
        return;
    };

    let price = cost.max(template.cost);
    if state.party.gold < price {
        state.log("Not enough gold to buy item.");
        return;
    }

    if let (Some(index), Some(room)) = (shop_index, state.current_room.as_mut()) {
        room.shop_items.remove(index);
    }
    let item = state.mint_item(&template);
    state.party.gold -= price;
    state.log(format!("Bought {}", item.display_name()));
    state.inventory.items.push(item);
}

pub fn sell_item(state: &mut RunState, item_id: &str) {
    let Some(item) = state.inventory.take(item_id) else {
        state.log("Item not found in inventory.");
        return;
    };
    state.party.gold += SELL_PRICE;
    state.log(format!("Sold {} for {SELL_PRICE} gold", item.display_name()));
}

/// Whether an item of this type may sit in the slot.
fn fits(item_type: ItemType, slot: EquipmentSlot) -> bool {
    use EquipmentSlot as S;
    match item_type {
        ItemType::Weapon => slot == S::MainHand,
        ItemType::Shield => slot == S::OffHand,
        ItemType::Head => slot == S::Head,
        ItemType::Chest => slot == S::Chest,
        ItemType::Legs => slot == S::Legs,
        ItemType::Feet => slot == S::Feet,
        ItemType::Neck => slot == S::Neck,
        ItemType::Ring => matches!(slot, S::Ring1 | S::Ring2),
    }
}

/// Move an item from the inventory onto a member. Whatever was in the slot
/// goes back to the inventory.
pub fn equip_item(state: &mut RunState, actor_id: &str, item_id: &str, slot: Option<EquipmentSlot>) {
    let Some(actor) = state.party.member(actor_id) else {
        return;
    };
    if !actor.is_alive {
        debug!(actor_id, "fallen members cannot change gear");
        return;
    }
    let Some(item) = state.inventory.items.iter().find(|i| i.id == item_id) else {
        return;
    };
    let slot = slot.unwrap_or_else(|| EquipmentSlot::for_item(item.item_type, &actor.equipment));
    if !fits(item.item_type, slot) {
        debug!(item_id, %slot, "item does not fit slot");
        return;
    }

    let Some(item) = state.inventory.take(item_id) else {
        return;
    };
    let Some(actor) = state.party.member_mut(actor_id) else {
        return;
    };
    let gained = item.total_stats().max_hp_bonus;
    let name = item.display_name().to_string();
    let previous = actor.equipment.insert(slot, item);
    let lost = previous.as_ref().map_or(0, |p| p.total_stats().max_hp_bonus);
    adjust_max_hp(actor, gained - lost);

    if let Some(previous) = previous {
        state.inventory.items.push(previous);
    }
    state.log(format!("Equipped {name} to {slot}"));
}

pub fn unequip_item(state: &mut RunState, actor_id: &str, slot: EquipmentSlot) {
    let Some(actor) = state.party.member_mut(actor_id).filter(|a| a.is_alive) else {
        debug!(actor_id, "no living member to unequip");
        return;
    };
    let Some(item) = actor.equipment.remove(&slot) else {
        return;
    };
    adjust_max_hp(actor, -item.total_stats().max_hp_bonus);
    state.log(format!("Unequipped {}.", item.display_name()));
    state.inventory.items.push(item);
}

/// Hire a mercenary from the room's offer, or from the catalog at level 1.
pub fn hire_recruit(state: &mut RunState, recruit_id: &str) {
    let offered = state
        .current_room
        .as_ref()
        .and_then(|r| r.available_recruits.iter().find(|r| r.id == recruit_id))
        .cloned();
    let recruit = offered.or_else(|| {
        get_recruit(recruit_id).map(|def| RecruitOption {
            id: def.id.to_string(),
            name: def.name.to_string(),
            role: def.role,
            cost: def.cost,
            description: def.description.to_string(),
            level: 1,
        })
    });
    let Some(recruit) = recruit else {
        warn!(recruit_id, "unknown recruit");
        return;
    };

    if state.party.gold < recruit.cost {
        state.log(format!(
            "Not enough gold to hire {}. Need {} gold.",
            recruit.name, recruit.cost
        ));
        return;
    }
    if state.party.members.len() >= MAX_PARTY_SIZE {
        state.log(format!("Party is full! Max {MAX_PARTY_SIZE} members."));
        return;
    }

    let mut n = state.party.members.len() + 1;
    while state.party.member(&format!("party-{n}")).is_some() {
        n += 1;
    }
    let member = create_actor(format!("party-{n}"), recruit.name.clone(), recruit.role, recruit.level, true);

    state.party.gold -= recruit.cost;
    state.party.members.push(member);
    if let Some(room) = state.current_room.as_mut() {
        room.available_recruits.retain(|r| r.id != recruit.id);
    }
    state.log(format!("{} joins the party!", recruit.name));
}

/// Give an owned item a custom name. An empty name clears it.
pub fn rename_item(state: &mut RunState, item_id: &str, new_name: &str) {
    let new_name = new_name.trim();
    let in_bag = state.inventory.items.iter_mut().find(|i| i.id == item_id);
    let item = match in_bag {
        Some(item) => Some(item),
        None => state
            .party
            .members
            .iter_mut()
            .flat_map(|m| m.equipment.values_mut())
            .find(|i| i.id == item_id),
    };
    let Some(item) = item else {
        return;
    };

    item.custom_name = if new_name.is_empty() {
        None
    } else {
        Some(new_name.to_string())
    };
    let shown = item.display_name().to_string();
    state.log(format!("Item renamed to \"{shown}\"."));
}

pub fn spend_stat_point(state: &mut RunState, actor_id: &str, stat: Skill) {
    let Some(actor) = state.party.member_mut(actor_id) else {
        return;
    };
    if actor.stat_points == 0 {
        return;
    }
    actor.stat_points -= 1;
    let value = actor.skills.get_mut(stat);
    *value += 1;
    let line = format!("{} raised {stat} to {value}.", actor.name);
    state.log(line);
}
