//! Short rests, long rests, and the rest taken at each segment boundary.

use super::ActionError;
use crate::content::abilities::UNTIL_REST;
use crate::content::themes::generate_theme;
use crate::content::MUTATIONS;
use crate::rng::RandomSource;
use crate::world::{RunState, SHORT_RESTS_PER_SEGMENT};
use tracing::{debug, info};

/// Stress removed by a segment long rest.
const SEGMENT_STRESS_RELIEF: i32 = 5;

/// Spend a short rest on the chosen members.
pub fn short_rest(state: &mut RunState, actor_ids: &[String]) {
    if state.in_combat() {
        return;
    }
    if state.short_rests_remaining == 0 {
        state.log("No short rests remaining.");
        return;
    }

    for member in state.party.members.iter_mut().filter(|m| m.is_alive) {
        if !actor_ids.contains(&member.id) {
            continue;
        }
        if member.hit_dice.current > 0 {
            member.hit_dice.current -= 1;
            member.hp.restore(member.hp.max / 2);
        } else {
            member.hp.restore(member.hp.max / 4);
        }
    }

    for member in &mut state.party.members {
        for ability in &mut member.abilities {
            if ability.current_cooldown >= UNTIL_REST {
                ability.current_cooldown = 0;
            }
        }
    }

    state.short_rests_remaining -= 1;
    state.log("Party took a short rest. Rest abilities restored!");
    debug!(remaining = state.short_rests_remaining, "short rest");
}

/// A full rest on demand. Dead members stay dead.
pub fn long_rest(state: &mut RunState) {
    if state.in_combat() {
        return;
    }
    for member in state.party.members.iter_mut().filter(|m| m.is_alive) {
        member.hp.current = member.hp.max;
        member.stress.current = 0;
        member.hit_dice.current = member.hit_dice.max;
        for ability in &mut member.abilities {
            ability.current_cooldown = 0;
        }
    }
    state.short_rests_remaining = SHORT_RESTS_PER_SEGMENT;
    state.long_rests_taken += 1;
    state.log("Party takes a long rest. All resources restored!");
}

/// The rest taken on reaching a segment boundary. May add a mutation and
/// always rolls a new theme.
pub fn segment_long_rest<R: RandomSource>(state: &mut RunState, rng: &mut R) -> Result<(), ActionError> {
    for member in state.party.members.iter_mut().filter(|m| m.is_alive) {
        member.hp.current = member.hp.max;
        let recovered = (member.hit_dice.max / 2).max(1);
        member.hit_dice.current = (member.hit_dice.current + recovered).min(member.hit_dice.max);
        member.stress.current = (member.stress.current - SEGMENT_STRESS_RELIEF).max(0);
        for ability in &mut member.abilities {
            ability.current_cooldown = 0;
        }
    }
    state.short_rests_remaining = SHORT_RESTS_PER_SEGMENT;
    state.long_rests_taken += 1;

    if rng.float() < 0.5 {
        let mutation = *rng.pick(&MUTATIONS)?;
        if !state.mutations.iter().any(|m| m == mutation) {
            state.mutations.push(mutation.to_string());
        }
        state.log("New Mutation Applied!");
    }

    state.theme_id = generate_theme(rng).to_string();
    state.log("Party took a Long Rest. Theme changed.");
    info!(depth = state.depth, theme = %state.theme_id, "segment long rest");
    Ok(())
}
