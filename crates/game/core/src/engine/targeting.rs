//! Target resolution for queued player actions.

use crate::ability::AbilityDefinition;
use crate::state::{CombatantId, CombatantState, Roster};

/// Picks the target for `ability` cast by `caster`.
///
/// Self-only abilities always land on the caster. An explicit name is tried
/// against living allies (when allowed) and then living enemies within
/// reach. Without a name or a match, enemy-facing abilities fall back to the
/// front-most enemy in reach and ally-only abilities to the caster.
pub fn resolve_target(
    roster: &Roster,
    caster: &CombatantState,
    ability: &AbilityDefinition,
    name: Option<&str>,
) -> Option<CombatantId> {
    let rule = &ability.target;
    if ability.targets_self() {
        return Some(caster.id);
    }

    let opposing = caster.side.opposing();
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        if rule.can_target_allies()
            && let Some(ally) = roster.find_living_by_name(caster.side, name)
        {
            return Some(ally);
        }
        if rule.can_target_enemies()
            && let Some(enemy) = roster.find_living_by_name(opposing, name)
            && roster.get(enemy).is_some_and(|e| rule.reaches(e.position))
        {
            return Some(enemy);
        }
    }

    if rule.can_target_enemies() {
        return roster.front_most(opposing, Some(rule));
    }
    rule.can_target_allies().then_some(caster.id)
}
