//! Run scoring.
//!
//! Shared by the client display and the server's anti-cheat recount, so it
//! reads nothing but the state itself.

use crate::world::RunState;

/// Score for a run: depth, gold, experience, and a tenth of the value of
/// every owned item.
pub fn calculate_score(state: &RunState) -> u64 {
    let depth = state.depth as u64 * 100;
    let gold = state.party.gold as u64;

    let experience: u64 = state
        .party
        .members
        .iter()
        .map(|m| m.xp as u64 + 500 * m.level.saturating_sub(1) as u64)
        .sum();

    let carried = state.inventory.items.iter();
    let equipped = state.party.members.iter().flat_map(|m| m.equipment.values());
    let items: u64 = carried.chain(equipped).map(|i| i.cost as u64 / 10).sum();

    depth + gold + experience + items
}
