//! Disjoint borrows of encounter state lent to the coordinator and the
//! orchestrator for the duration of one operation.

use crate::config::CombatConfig;
use crate::env::{CombatEnv, Dice};
use crate::events::{CombatEvent, EventLog};
use crate::resolve::{ActionOutcome, grant_wrath_from_suffering};
use crate::state::{CombatantId, Roster, Side};

use super::EncounterStats;

pub(crate) struct CombatContext<'a> {
    pub roster: &'a mut Roster,
    pub env: CombatEnv<'a>,
    pub config: &'a CombatConfig,
    pub events: &'a mut EventLog,
    pub stats: &'a mut EncounterStats,
    pub dice: Dice<'a>,
}

impl CombatContext<'_> {
    /// Publishes a resolved action and returns the combatants it killed.
    pub fn report_outcome(&mut self, outcome: ActionOutcome) -> Vec<CombatantId> {
        let caster = self.roster.get(outcome.caster);
        let caster_name = caster.map(|c| c.name.clone()).unwrap_or_default();
        if let Some(participant) = caster.and_then(|c| c.participant.as_ref()) {
            self.stats.record_action(participant, &outcome);
        }

        let deaths: Vec<_> = outcome.deaths().collect();
        let applied: Vec<_> = outcome
            .targets
            .iter()
            .flat_map(|t| t.applied.iter().map(move |name| (t.target, name.clone())))
            .collect();

        self.events.push(CombatEvent::ActionResolved {
            caster_name,
            outcome,
        });
        for (target, effect) in applied {
            self.events.push(CombatEvent::StatusApplied { target, effect });
        }
        for &id in &deaths {
            self.announce_death(id);
        }
        deaths
    }

    /// Ticks the effects of every living combatant on `side` in board order.
    pub fn tick_side(&mut self, side: Side) -> Vec<CombatantId> {
        let mut deaths = Vec::new();
        for id in self.roster.living_ids(side) {
            let Some(combatant) = self.roster.get_mut(id) else {
                continue;
            };
            let ticks = combatant.tick_effects();
            let died = !combatant.is_alive();

            for tick in ticks {
                let wrath = if side == Side::Player && tick.damage > 0 {
                    grant_wrath_from_suffering(
                        self.roster,
                        tick.damage,
                        self.config.wrath_from_damage_percent,
                    )
                } else {
                    Vec::new()
                };
                self.events.push(CombatEvent::StatusTicked {
                    target: id,
                    effect: tick.name.clone(),
                    damage: tick.damage,
                    healed: tick.healed,
                });
                for (cleric, amount) in wrath {
                    self.events.push(CombatEvent::ResourceRegenerated {
                        combatant: cleric,
                        resource: "wrath".into(),
                        amount,
                    });
                }
                if tick.expired {
                    self.events.push(CombatEvent::StatusExpired {
                        target: id,
                        effect: tick.name,
                    });
                }
            }

            if died {
                self.announce_death(id);
                deaths.push(id);
            }
        }
        deaths
    }

    fn announce_death(&mut self, id: CombatantId) {
        let Some(dead) = self.roster.get(id) else {
            return;
        };
        tracing::info!(
            target: "expedition::combat",
            combatant = %id,
            name = %dead.name,
            side = %dead.side,
            "combatant died"
        );
        self.events.push(CombatEvent::CombatantDied {
            combatant: id,
            name: dead.name.clone(),
            side: dead.side,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterClass, ClassResources, CombatantState, StatusEffectInstance};
    use crate::test_support::{Fixture, profile};

    #[test]
    fn bleeding_player_feeds_cleric_wrath() {
        let fixture = Fixture::new();
        let config = CombatConfig::unpaced();
        let mut roster = Roster::new();
        let mut events = EventLog::new();
        let mut stats = EncounterStats::default();
        let mut nonce = 0;

        let fighter_id = roster.allocate_id();
        let mut fighter = CombatantState::new_player(
            fighter_id,
            &profile("ana", CharacterClass::Fighter),
            CharacterClass::Fighter,
            1,
        );
        fighter.apply_effect(StatusEffectInstance {
            name: "Bleeding".into(),
            remaining: 2,
            damage_multiplier: 1.0,
            defense_multiplier: 1.0,
            damage_over_time: 10,
        });
        roster.insert(fighter);
        let cleric_id = roster.allocate_id();
        roster.insert(CombatantState::new_player(
            cleric_id,
            &profile("ben", CharacterClass::Cleric),
            CharacterClass::Cleric,
            2,
        ));

        let mut ctx = CombatContext {
            roster: &mut roster,
            env: fixture.env(),
            config: &config,
            events: &mut events,
            stats: &mut stats,
            dice: Dice::new(&fixture.rng, 1, &mut nonce),
        };
        assert!(ctx.tick_side(Side::Player).is_empty());

        let gained: Vec<_> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e.event {
                CombatEvent::ResourceRegenerated {
                    combatant,
                    resource,
                    amount,
                } => Some((combatant, resource, amount)),
                _ => None,
            })
            .collect();
        assert_eq!(gained, vec![(cleric_id, "wrath".to_string(), 5)]);
        assert_eq!(
            roster.get(cleric_id).map(|c| c.resources().clone()),
            Some(ClassResources::Cleric { wrath: 5 })
        );
    }
}
