use crate::ability::AbilityDefinition;
use crate::env::AbilityOracle;
use crate::state::{CombatantId, CombatantState, Roster, Side};

/// Ability and target chosen for one enemy this turn.
#[derive(Clone, Copy, Debug)]
pub struct EnemyDecision<'a> {
    /// Index into the enemy's cooldown slots.
    pub slot: usize,
    pub ability: &'a AbilityDefinition,
    pub target: CombatantId,
}

/// Why an enemy spends its turn doing nothing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EnemyIdleReason {
    #[error("has no abilities")]
    NoAbilities,

    #[error("ability '{0}' is not in the catalog")]
    UnknownAbility(String),

    #[error("no living player to target")]
    NoTarget,
}

pub struct EnemyDecisionProcedure;

impl EnemyDecisionProcedure {
    /// First ability off cooldown, else the first ability regardless of
    /// cooldown. Self-only abilities target the enemy itself; everything else
    /// targets the front-most living player.
    pub fn choose<'a>(
        enemy: &CombatantState,
        roster: &Roster,
        abilities: &'a dyn AbilityOracle,
    ) -> Result<EnemyDecision<'a>, EnemyIdleReason> {
        let cooldowns = enemy
            .resources()
            .enemy_cooldowns()
            .filter(|c| !c.is_empty())
            .ok_or(EnemyIdleReason::NoAbilities)?;

        let slot = cooldowns.first_ready().unwrap_or(0);
        let command = &cooldowns.slots()[slot].ability;
        let ability = abilities
            .lookup(command)
            .ok_or_else(|| EnemyIdleReason::UnknownAbility(command.clone()))?;

        let target = if ability.targets_self() || !ability.target.can_target_enemies() {
            enemy.id
        } else {
            roster
                .front_most(Side::Player, None)
                .ok_or(EnemyIdleReason::NoTarget)?
        };

        Ok(EnemyDecision {
            slot,
            ability,
            target,
        })
    }

    /// End-of-action cooldown bookkeeping: the used slot restarts at its
    /// cooldown, then every slot ticks down by one.
    pub fn finish_turn(enemy: &mut CombatantState, used: Option<(usize, u32)>) {
        let Some(cooldowns) = enemy.resources_mut().enemy_cooldowns_mut() else {
            return;
        };
        if let Some((slot, cooldown)) = used {
            cooldowns.start(slot, cooldown);
        }
        cooldowns.decrement_all();
    }
}
