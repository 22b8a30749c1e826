//! Player turn window and the resolution pipeline.
//!
//! A turn opens with a countdown during which participants queue and confirm
//! actions. When every living player has confirmed, or the countdown runs
//! out, the queue is frozen, ordered Buff → Heal → Damage (each by caster
//! position) and played out one step at a time, followed by the enemy phase.
//! Steps are paced by the host clock; with zero pacing a whole pass runs in a
//! single advance.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::ability::{AbilityCategory, AbilityDefinition};
use crate::ai::EnemyDecisionProcedure;
use crate::env::AbilityOracle;
use crate::error::{ErrorSeverity, GameError};
use crate::events::CombatEvent;
use crate::resolve::ActionResolver;
use crate::state::{AffordError, CombatantId, CombatantState, ParticipantId, Roster, Side};

use super::clock::Countdown;
use super::context::CombatContext;
use super::targeting::resolve_target;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    AwaitingPlayerActions,
    Resolving,
    EnemyTurn,
    WaveCleared,
    PartyWiped,
}

/// One participant's pending action for the current turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedAction {
    pub caster: CombatantId,
    /// Ability command key.
    pub ability: String,
    pub category: AbilityCategory,
    pub target: CombatantId,
    pub confirmed: bool,
    /// Assigned by the turn timeout rather than the participant.
    pub defaulted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueReceipt {
    /// Display name of the queued ability.
    pub ability: String,
    /// Display name of the resolved target.
    pub target: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmReceipt {
    /// Every living player has now confirmed; resolution starts immediately.
    pub all_confirmed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueRejection {
    #[error("you're not in this expedition")]
    NotParticipant,

    #[error("you're dead and cannot act")]
    Dead,

    #[error("it's not the player turn right now")]
    WrongPhase,

    #[error("unknown ability '{0}'")]
    UnknownAbility(String),

    #[error("you can't use {ability}")]
    WrongClass { ability: String },

    #[error("not enough resources for {ability}: {reason}")]
    CannotAfford {
        ability: String,
        #[source]
        reason: AffordError,
    },

    #[error("no valid target for {ability}")]
    NoValidTarget { ability: String },
}

impl GameError for QueueRejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotParticipant | Self::UnknownAbility(_) | Self::WrongClass { .. } => {
                ErrorSeverity::Validation
            }
            Self::Dead
            | Self::WrongPhase
            | Self::CannotAfford { .. }
            | Self::NoValidTarget { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotParticipant => "QUEUE_NOT_PARTICIPANT",
            Self::Dead => "QUEUE_DEAD",
            Self::WrongPhase => "QUEUE_WRONG_PHASE",
            Self::UnknownAbility(_) => "QUEUE_UNKNOWN_ABILITY",
            Self::WrongClass { .. } => "QUEUE_WRONG_CLASS",
            Self::CannotAfford { .. } => "QUEUE_CANNOT_AFFORD",
            Self::NoValidTarget { .. } => "QUEUE_NO_TARGET",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmRejection {
    #[error("you're not in this expedition")]
    NotParticipant,

    #[error("you're dead and cannot act")]
    Dead,

    #[error("it's not the player turn right now")]
    WrongPhase,

    #[error("you haven't queued an action yet")]
    NothingQueued,
}

impl GameError for ConfirmRejection {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotParticipant => ErrorSeverity::Validation,
            Self::Dead | Self::WrongPhase | Self::NothingQueued => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotParticipant => "CONFIRM_NOT_PARTICIPANT",
            Self::Dead => "CONFIRM_DEAD",
            Self::WrongPhase => "CONFIRM_WRONG_PHASE",
            Self::NothingQueued => "CONFIRM_NOTHING_QUEUED",
        }
    }
}

/// End-of-pass outcome that hands control back to the wave orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnSignal {
    WaveCleared,
    PartyWiped,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub deaths: Vec<CombatantId>,
    pub signal: Option<TurnSignal>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnPoll {
    /// Nothing more can happen within the remaining budget.
    Waiting,
    Progressed(StepReport),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Player(QueuedAction),
    TickPlayers,
    Enemy(CombatantId),
    TickEnemies,
}

#[derive(Clone, Debug, Default)]
pub struct TurnCoordinator {
    phase: TurnPhase,
    turn: u32,
    pending: BTreeMap<ParticipantId, QueuedAction>,
    timer: Countdown,
    announced_seconds: u64,
    steps: VecDeque<Step>,
    pacing: Countdown,
}

impl TurnCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Number of turns opened in this encounter.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn seconds_remaining(&self) -> Option<u64> {
        (self.phase == TurnPhase::AwaitingPlayerActions).then(|| self.timer.whole_seconds())
    }

    pub fn pending(&self) -> impl Iterator<Item = (&ParticipantId, &QueuedAction)> {
        self.pending.iter()
    }

    pub fn pending_action(&self, participant: &ParticipantId) -> Option<&QueuedAction> {
        self.pending.get(participant)
    }

    /// Back to `Idle` with nothing pending, keeping the turn counter.
    pub(crate) fn stand_down(&mut self) {
        self.phase = TurnPhase::Idle;
        self.pending.clear();
        self.steps.clear();
        self.timer.stop();
        self.pacing.stop();
    }

    /// Opens a player turn: clears the queue, runs start-of-turn upkeep for
    /// every living player and starts the countdown.
    pub(crate) fn open_turn(&mut self, ctx: &mut CombatContext<'_>) {
        self.turn += 1;
        self.phase = TurnPhase::AwaitingPlayerActions;
        self.pending.clear();
        self.steps.clear();
        self.pacing.stop();

        let regen_percent = ctx.config.mana_regen_percent as i32;
        for id in ctx.roster.living_ids(Side::Player) {
            let Some(player) = ctx.roster.get_mut(id) else {
                continue;
            };
            player.reset_turn_flags();
            let intelligence = player.stats().attributes.intelligence;
            let resources = player.resources_mut();
            resources.on_turn_start();
            let gained = resources.regenerate_mana(intelligence * regen_percent / 100);
            if gained > 0 {
                ctx.events.push(CombatEvent::ResourceRegenerated {
                    combatant: id,
                    resource: "mana".into(),
                    amount: gained,
                });
            }
        }
        for id in ctx.roster.living_ids(Side::Enemy) {
            if let Some(enemy) = ctx.roster.get_mut(id) {
                enemy.reset_turn_flags();
            }
        }

        self.timer.start(ctx.config.turn_timer());
        self.announced_seconds = self.timer.whole_seconds();
        tracing::debug!(
            target: "expedition::turn",
            turn = self.turn,
            seconds = self.announced_seconds,
            "player turn opened"
        );
        ctx.events.push(CombatEvent::TurnOpened {
            turn: self.turn,
            seconds: self.announced_seconds,
        });
    }

    /// Validates and queues an action, replacing any earlier entry from the
    /// same participant this turn.
    pub(crate) fn queue_action(
        &mut self,
        ctx: &mut CombatContext<'_>,
        participant: &ParticipantId,
        command: &str,
        target_name: Option<&str>,
    ) -> Result<QueueReceipt, QueueRejection> {
        let caster = ctx
            .roster
            .by_participant(participant)
            .ok_or(QueueRejection::NotParticipant)?;
        if !caster.is_alive() {
            return Err(QueueRejection::Dead);
        }
        if self.phase != TurnPhase::AwaitingPlayerActions {
            return Err(QueueRejection::WrongPhase);
        }

        let (action, ability) = plan_action(ctx.roster, ctx.env.abilities, caster, command, target_name)?;
        let receipt = QueueReceipt {
            ability: ability.name.clone(),
            target: target_label(ctx.roster, action.target),
        };

        tracing::debug!(
            target: "expedition::turn",
            participant = %participant,
            ability = %ability.command,
            target_id = %action.target,
            "action queued"
        );
        ctx.events.push(CombatEvent::ActionQueued {
            participant: participant.clone(),
            ability: receipt.ability.clone(),
            target: receipt.target.clone(),
        });
        self.pending.insert(participant.clone(), action);
        Ok(receipt)
    }

    pub(crate) fn confirm_action(
        &mut self,
        ctx: &mut CombatContext<'_>,
        participant: &ParticipantId,
    ) -> Result<ConfirmReceipt, ConfirmRejection> {
        let caster = ctx
            .roster
            .by_participant(participant)
            .ok_or(ConfirmRejection::NotParticipant)?;
        if !caster.is_alive() {
            return Err(ConfirmRejection::Dead);
        }
        if self.phase != TurnPhase::AwaitingPlayerActions {
            return Err(ConfirmRejection::WrongPhase);
        }
        let action = self
            .pending
            .get_mut(participant)
            .ok_or(ConfirmRejection::NothingQueued)?;
        action.confirmed = true;
        ctx.events.push(CombatEvent::ActionConfirmed {
            participant: participant.clone(),
        });

        let all_confirmed = self.all_confirmed(ctx.roster);
        if all_confirmed {
            tracing::debug!(target: "expedition::turn", turn = self.turn, "all players confirmed");
            self.timer.short_circuit();
        }
        Ok(ConfirmReceipt { all_confirmed })
    }

    /// Advances the turn by as much of `budget` as it can use.
    pub(crate) fn poll(&mut self, budget: &mut Duration, ctx: &mut CombatContext<'_>) -> TurnPoll {
        match self.phase {
            TurnPhase::AwaitingPlayerActions => {
                if self.timer.drain(budget) {
                    self.assign_defaults(ctx);
                    self.begin_resolution(ctx);
                    return TurnPoll::Progressed(StepReport::default());
                }
                let seconds = self.timer.whole_seconds();
                if seconds != self.announced_seconds {
                    self.announced_seconds = seconds;
                    ctx.events.push(CombatEvent::TurnTimer {
                        turn: self.turn,
                        seconds_remaining: seconds,
                    });
                }
                TurnPoll::Waiting
            }
            TurnPhase::Resolving | TurnPhase::EnemyTurn => {
                if !self.pacing.drain(budget) {
                    return TurnPoll::Waiting;
                }
                match self.steps.pop_front() {
                    Some(step) => TurnPoll::Progressed(self.run_step(step, ctx)),
                    None => {
                        tracing::warn!(
                            target: "expedition::turn",
                            phase = %self.phase,
                            "resolution ran out of steps; reopening the turn"
                        );
                        self.open_turn(ctx);
                        TurnPoll::Progressed(StepReport::default())
                    }
                }
            }
            TurnPhase::Idle | TurnPhase::WaveCleared | TurnPhase::PartyWiped => TurnPoll::Waiting,
        }
    }

    /// Every living player holds a confirmed action. The living set is
    /// recomputed on each call so deaths mid-turn are accounted for.
    fn all_confirmed(&self, roster: &Roster) -> bool {
        let living = roster.living(Side::Player);
        !living.is_empty()
            && living.iter().all(|player| {
                player
                    .participant
                    .as_ref()
                    .and_then(|p| self.pending.get(p))
                    .is_some_and(|action| action.confirmed)
            })
    }

    /// Replaces every missing or unconfirmed action with the class default.
    fn assign_defaults(&mut self, ctx: &mut CombatContext<'_>) {
        for player in ctx.roster.living(Side::Player) {
            let Some(participant) = player.participant.as_ref() else {
                continue;
            };
            if self.pending.get(participant).is_some_and(|a| a.confirmed) {
                continue;
            }
            let Some(class) = player.class else {
                continue;
            };
            let command = class.default_ability();

            match plan_action(ctx.roster, ctx.env.abilities, player, command, None) {
                Ok((mut action, ability)) => {
                    action.confirmed = true;
                    action.defaulted = true;
                    ctx.events.push(CombatEvent::DefaultActionAssigned {
                        participant: participant.clone(),
                        ability: ability.name.clone(),
                        target: target_label(ctx.roster, action.target),
                    });
                    self.pending.insert(participant.clone(), action);
                }
                Err(reason) => {
                    // An unconfirmed manual choice, if any, still resolves.
                    tracing::warn!(
                        target: "expedition::turn",
                        participant = %participant,
                        ability = command,
                        %reason,
                        "default action unavailable"
                    );
                }
            }
        }
    }

    fn begin_resolution(&mut self, ctx: &mut CombatContext<'_>) {
        self.phase = TurnPhase::Resolving;
        self.timer.stop();

        let mut actions: Vec<_> = std::mem::take(&mut self.pending).into_values().collect();
        actions.sort_by_key(|action| {
            let position = ctx.roster.get(action.caster).map_or(u8::MAX, |c| c.position);
            (action.category, position, action.caster)
        });

        tracing::debug!(
            target: "expedition::turn",
            turn = self.turn,
            actions = actions.len(),
            "turn closed"
        );
        ctx.events.push(CombatEvent::TurnClosed {
            turn: self.turn,
            actions: actions.len(),
        });

        self.steps = actions.into_iter().map(Step::Player).collect();
        self.steps.push_back(Step::TickPlayers);
        self.pacing.start(Duration::ZERO);
    }

    fn run_step(&mut self, step: Step, ctx: &mut CombatContext<'_>) -> StepReport {
        let mut report = StepReport::default();
        match step {
            Step::Player(action) => {
                report.deaths = resolve_player_action(&action, ctx);
                if ctx.roster.living_count(Side::Enemy) == 0 {
                    self.steps.retain(|s| !matches!(s, Step::Player(_)));
                }
                self.pacing.start(ctx.config.action_pacing());
            }
            Step::TickPlayers => {
                report.deaths = ctx.tick_side(Side::Player);
                if ctx.roster.living_count(Side::Enemy) == 0 {
                    report.signal = Some(self.finish(TurnPhase::WaveCleared));
                } else {
                    self.phase = TurnPhase::EnemyTurn;
                    self.steps.extend(ctx.roster.living_ids(Side::Enemy).into_iter().map(Step::Enemy));
                    self.steps.push_back(Step::TickEnemies);
                    self.pacing.start(Duration::ZERO);
                }
            }
            Step::Enemy(id) => {
                report.deaths = resolve_enemy_action(id, ctx);
                self.pacing.start(ctx.config.enemy_pacing());
            }
            Step::TickEnemies => {
                report.deaths = ctx.tick_side(Side::Enemy);
                if ctx.roster.living_count(Side::Enemy) == 0 {
                    report.signal = Some(self.finish(TurnPhase::WaveCleared));
                } else if ctx.roster.living_count(Side::Player) == 0 {
                    report.signal = Some(self.finish(TurnPhase::PartyWiped));
                } else {
                    self.open_turn(ctx);
                }
            }
        }
        report
    }

    fn finish(&mut self, phase: TurnPhase) -> TurnSignal {
        self.phase = phase;
        self.steps.clear();
        self.pacing.stop();
        tracing::debug!(target: "expedition::turn", turn = self.turn, %phase, "resolution pass ended");
        match phase {
            TurnPhase::PartyWiped => TurnSignal::PartyWiped,
            _ => TurnSignal::WaveCleared,
        }
    }
}

/// Validation shared by participant queues and timeout defaults: ability
/// exists, matches the class, is affordable and has a target.
fn plan_action<'a>(
    roster: &Roster,
    abilities: &'a dyn AbilityOracle,
    caster: &CombatantState,
    command: &str,
    target_name: Option<&str>,
) -> Result<(QueuedAction, &'a AbilityDefinition), QueueRejection> {
    let ability = abilities
        .lookup(command)
        .ok_or_else(|| QueueRejection::UnknownAbility(command.to_string()))?;
    if !ability.usable_by(caster.class) {
        return Err(QueueRejection::WrongClass {
            ability: ability.name.clone(),
        });
    }
    caster
        .resources()
        .check_affordable(ability)
        .map_err(|reason| QueueRejection::CannotAfford {
            ability: ability.name.clone(),
            reason,
        })?;
    let target = resolve_target(roster, caster, ability, target_name).ok_or_else(|| {
        QueueRejection::NoValidTarget {
            ability: ability.name.clone(),
        }
    })?;

    let action = QueuedAction {
        caster: caster.id,
        ability: ability.command.clone(),
        category: ability.category,
        target,
        confirmed: false,
        defaulted: false,
    };
    Ok((action, ability))
}

fn target_label(roster: &Roster, id: CombatantId) -> String {
    roster
        .get(id)
        .map_or_else(|| id.to_string(), |c| c.name.clone())
}

fn resolve_player_action(action: &QueuedAction, ctx: &mut CombatContext<'_>) -> Vec<CombatantId> {
    let Some(ability) = ctx.env.abilities.lookup(&action.ability) else {
        tracing::warn!(
            target: "expedition::turn",
            caster = %action.caster,
            ability = %action.ability,
            "queued ability vanished from the catalog"
        );
        return Vec::new();
    };
    let resolved = ActionResolver::new(ctx.config).resolve(
        ctx.roster,
        action.caster,
        action.target,
        ability,
        &mut ctx.dice,
    );
    match resolved {
        Ok(outcome) => ctx.report_outcome(outcome),
        Err(abort) => {
            tracing::debug!(
                target: "expedition::turn",
                caster = %action.caster,
                ability = %action.ability,
                %abort,
                "action skipped"
            );
            ctx.events.push(CombatEvent::ActionSkipped {
                caster: action.caster,
                ability: ability.name.clone(),
                reason: abort.to_string(),
            });
            Vec::new()
        }
    }
}

fn resolve_enemy_action(id: CombatantId, ctx: &mut CombatContext<'_>) -> Vec<CombatantId> {
    let Some(enemy) = ctx.roster.get(id).filter(|e| e.is_alive()) else {
        return Vec::new();
    };

    let decision = match EnemyDecisionProcedure::choose(enemy, ctx.roster, ctx.env.abilities) {
        Ok(decision) => decision,
        Err(reason) => {
            tracing::warn!(
                target: "expedition::enemy",
                enemy = %id,
                name = %enemy.name,
                %reason,
                "enemy idles"
            );
            ctx.events.push(CombatEvent::EnemyIdle {
                enemy: id,
                reason: reason.to_string(),
            });
            if let Some(enemy) = ctx.roster.get_mut(id) {
                EnemyDecisionProcedure::finish_turn(enemy, None);
            }
            return Vec::new();
        }
    };

    let resolved = ActionResolver::new(ctx.config).resolve(
        ctx.roster,
        id,
        decision.target,
        decision.ability,
        &mut ctx.dice,
    );
    if let Some(enemy) = ctx.roster.get_mut(id) {
        EnemyDecisionProcedure::finish_turn(enemy, Some((decision.slot, decision.ability.cooldown)));
    }
    match resolved {
        Ok(outcome) => ctx.report_outcome(outcome),
        Err(abort) => {
            ctx.events.push(CombatEvent::ActionSkipped {
                caster: id,
                ability: decision.ability.name.clone(),
                reason: abort.to_string(),
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::CombatConfig;
    use crate::engine::{Encounter, EncounterPhase};
    use crate::env::Difficulty;
    use crate::events::CombatEvent;
    use crate::state::{CharacterClass, ParticipantId};
    use crate::test_support::{Fixture, profile, steady_attributes};

    #[test]
    fn action_on_a_target_killed_earlier_in_the_pass_is_skipped() {
        let fixture = Fixture::new();
        let env = fixture.env();
        let mut encounter = Encounter::new(CombatConfig::unpaced(), 5).unwrap();
        encounter.start(env, Difficulty::Hard).unwrap();
        for name in ["ana", "ben"] {
            let mut strong = profile(name, CharacterClass::Fighter);
            strong.attributes = steady_attributes(30);
            encounter.join(env, strong, None).unwrap();
        }
        encounter.advance(env, Duration::from_secs(60));
        assert_eq!(encounter.phase(), EncounterPhase::PlayerTurnOpen);
        encounter.drain_events();

        for name in ["ana", "ben"] {
            let who = ParticipantId::new(name);
            let receipt = encounter
                .queue_action(env, &who, "strike", Some("goblin"))
                .unwrap();
            assert_eq!(receipt.target, "Goblin");
            encounter.confirm_action(env, &who).unwrap();
        }

        let ben = encounter
            .roster()
            .by_participant(&ParticipantId::new("ben"))
            .unwrap()
            .id;
        let events = encounter.drain_events();
        assert!(events.iter().any(|e| matches!(
            &e.event,
            CombatEvent::CombatantDied { name, .. } if name == "Goblin"
        )));
        let skipped: Vec<_> = events
            .iter()
            .filter_map(|e| match &e.event {
                CombatEvent::ActionSkipped { caster, reason, .. } => Some((*caster, reason.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, ben);
        assert!(skipped[0].1.contains("dead"));

        // The rest of the wave still fights back and a new turn opens.
        assert_eq!(encounter.phase(), EncounterPhase::PlayerTurnOpen);
        assert_eq!(encounter.turns().turn(), 2);
    }
}
