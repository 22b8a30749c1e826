use std::time::Duration;

use crate::config::{CombatConfig, ConfigError};
use crate::env::{CombatEnv, Dice, Difficulty};
use crate::events::{CombatantView, EncounterSummary, EventLog, SequencedEvent};
use crate::state::{ParticipantId, ParticipantProfile, ProfileWriteback, Roster};

use super::context::CombatContext;
use super::stats::EncounterStats;
use super::turns::{
    ConfirmReceipt, ConfirmRejection, QueueReceipt, QueueRejection, StepReport, TurnCoordinator,
    TurnPhase, TurnPoll, TurnSignal,
};
use super::waves::{
    EncounterStage, JoinReceipt, JoinRejection, StartError, WaveOrchestrator, WaveProgress,
};

/// Externally visible phase of the live encounter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EncounterPhase {
    #[default]
    Idle,
    AwaitingPlayers,
    PlayerTurnOpen,
    Resolving,
    EnemyTurn,
    WaveCleared,
    Complete,
}

/// Read-only view for presentation and status commands.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterSnapshot {
    pub phase: EncounterPhase,
    pub difficulty: Option<Difficulty>,
    /// One-based number of the current wave.
    pub wave: usize,
    pub total_waves: usize,
    pub turn: u32,
    /// Whole seconds left on whichever countdown is running.
    pub seconds_remaining: Option<u64>,
    pub combatants: Vec<CombatantView>,
    pub pending_actions: usize,
    pub participants: usize,
    pub fallen: usize,
}

/// Owning context for one live encounter at a time.
///
/// The encounter holds every piece of mutable combat state. Read-only
/// collaborators arrive as a [`CombatEnv`] on each call, and time only moves
/// when the host calls [`Encounter::advance`].
pub struct Encounter {
    config: CombatConfig,
    seed: u64,
    nonce: u64,
    roster: Roster,
    turns: TurnCoordinator,
    waves: WaveOrchestrator,
    stats: EncounterStats,
    events: EventLog,
}

impl Encounter {
    pub fn new(config: CombatConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            nonce: 0,
            roster: Roster::new(),
            turns: TurnCoordinator::new(),
            waves: WaveOrchestrator::new(),
            stats: EncounterStats::default(),
            events: EventLog::new(),
        })
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn turns(&self) -> &TurnCoordinator {
        &self.turns
    }

    pub fn waves(&self) -> &WaveOrchestrator {
        &self.waves
    }

    pub fn stats(&self) -> &EncounterStats {
        &self.stats
    }

    /// Summary of the last completed encounter.
    pub fn summary(&self) -> Option<&EncounterSummary> {
        self.waves.summary()
    }

    pub fn phase(&self) -> EncounterPhase {
        match self.waves.stage() {
            EncounterStage::Idle => EncounterPhase::Idle,
            EncounterStage::Joining => EncounterPhase::AwaitingPlayers,
            EncounterStage::Resting => EncounterPhase::WaveCleared,
            EncounterStage::Complete => EncounterPhase::Complete,
            EncounterStage::Fighting => match self.turns.phase() {
                TurnPhase::AwaitingPlayerActions => EncounterPhase::PlayerTurnOpen,
                TurnPhase::EnemyTurn => EncounterPhase::EnemyTurn,
                TurnPhase::WaveCleared => EncounterPhase::WaveCleared,
                TurnPhase::Idle | TurnPhase::Resolving | TurnPhase::PartyWiped => {
                    EncounterPhase::Resolving
                }
            },
        }
    }

    pub fn start(&mut self, env: CombatEnv<'_>, difficulty: Difficulty) -> Result<(), StartError> {
        let (turns, waves, mut ctx) = self.split(env);
        waves.start_encounter(&mut ctx, difficulty)?;
        *turns = TurnCoordinator::new();
        Ok(())
    }

    pub fn join(
        &mut self,
        env: CombatEnv<'_>,
        profile: ParticipantProfile,
        position: Option<u8>,
    ) -> Result<JoinReceipt, JoinRejection> {
        let late_join_open = self.waves.stage() == EncounterStage::Resting
            || self.turns.phase() == TurnPhase::AwaitingPlayerActions;
        let receipt = {
            let (_, waves, mut ctx) = self.split(env);
            waves.add_participant(&mut ctx, profile, position, late_join_open)?
        };
        // A full party starts without waiting out the join timer.
        self.advance(env, Duration::ZERO);
        Ok(receipt)
    }

    pub fn queue_action(
        &mut self,
        env: CombatEnv<'_>,
        participant: &ParticipantId,
        ability: &str,
        target: Option<&str>,
    ) -> Result<QueueReceipt, QueueRejection> {
        let (turns, _, mut ctx) = self.split(env);
        turns.queue_action(&mut ctx, participant, ability, target)
    }

    /// Confirms a queued action. The last confirmation starts resolution
    /// right away.
    pub fn confirm_action(
        &mut self,
        env: CombatEnv<'_>,
        participant: &ParticipantId,
    ) -> Result<ConfirmReceipt, ConfirmRejection> {
        let receipt = {
            let (turns, _, mut ctx) = self.split(env);
            turns.confirm_action(&mut ctx, participant)?
        };
        if receipt.all_confirmed {
            self.advance(env, Duration::ZERO);
        }
        Ok(receipt)
    }

    /// Moves the encounter clock forward by `elapsed`, running every
    /// transition that falls inside it.
    pub fn advance(&mut self, env: CombatEnv<'_>, elapsed: Duration) {
        let mut budget = elapsed;
        let (turns, waves, mut ctx) = self.split(env);
        loop {
            let progressed = match waves.stage() {
                EncounterStage::Joining => {
                    let fired = waves.poll_join(&mut budget);
                    if fired && waves.start_expedition(&mut ctx) {
                        spawn_wave(turns, waves, &mut ctx);
                    }
                    fired
                }
                EncounterStage::Resting => {
                    let fired = waves.poll_rest(&mut budget);
                    if fired {
                        spawn_wave(turns, waves, &mut ctx);
                    }
                    fired
                }
                EncounterStage::Fighting => match turns.poll(&mut budget, &mut ctx) {
                    TurnPoll::Waiting => false,
                    TurnPoll::Progressed(report) => {
                        settle_step(turns, waves, &mut ctx, report);
                        true
                    }
                },
                EncounterStage::Idle | EncounterStage::Complete => false,
            };
            if !progressed {
                break;
            }
        }
    }

    /// Stops a live encounter early, for example when the host shuts down.
    /// Survivors get a writeback without a reward; the encounter returns to
    /// idle. Returns false when no encounter was live.
    pub fn abandon(&mut self, env: CombatEnv<'_>, reason: &str) -> bool {
        let (turns, waves, mut ctx) = self.split(env);
        if !waves.abandon(&mut ctx, reason) {
            return false;
        }
        turns.stand_down();
        true
    }

    pub fn drain_events(&mut self) -> Vec<SequencedEvent> {
        self.events.drain()
    }

    pub fn drain_writebacks(&mut self) -> Vec<ProfileWriteback> {
        self.waves.drain_writebacks()
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        let phase = self.phase();
        let seconds_remaining = match phase {
            EncounterPhase::AwaitingPlayers => self.waves.join_seconds_remaining(),
            EncounterPhase::PlayerTurnOpen => self.turns.seconds_remaining(),
            EncounterPhase::WaveCleared => self.waves.rest_seconds_remaining(),
            _ => None,
        };
        EncounterSnapshot {
            phase,
            difficulty: self.waves.difficulty(),
            wave: self.waves.wave_number().min(self.waves.total_waves()),
            total_waves: self.waves.total_waves(),
            turn: self.turns.turn(),
            seconds_remaining,
            combatants: self.roster.iter().map(CombatantView::from).collect(),
            pending_actions: self.turns.pending().count(),
            participants: self.waves.participants().len(),
            fallen: self.waves.fallen().len(),
        }
    }

    fn split<'s>(
        &'s mut self,
        env: CombatEnv<'s>,
    ) -> (&'s mut TurnCoordinator, &'s mut WaveOrchestrator, CombatContext<'s>) {
        let Self {
            config,
            seed,
            nonce,
            roster,
            turns,
            waves,
            stats,
            events,
        } = self;
        let ctx = CombatContext {
            roster,
            env,
            config,
            events,
            stats,
            dice: Dice::new(env.rng, *seed, nonce),
        };
        (turns, waves, ctx)
    }
}

fn spawn_wave(turns: &mut TurnCoordinator, waves: &mut WaveOrchestrator, ctx: &mut CombatContext<'_>) {
    if waves.advance_wave(ctx) == 0 {
        tracing::warn!(
            target: "expedition::wave",
            wave = waves.wave_number(),
            "wave spawned no enemies; treating it as cleared"
        );
        clear_wave(turns, waves, ctx);
        return;
    }
    turns.open_turn(ctx);
}

fn clear_wave(turns: &mut TurnCoordinator, waves: &mut WaveOrchestrator, ctx: &mut CombatContext<'_>) {
    turns.stand_down();
    if waves.on_wave_cleared(ctx) == WaveProgress::Victory {
        waves.complete(ctx, true);
    }
}

/// Applies the consequences of one resolution step. A wipe is checked before
/// the coordinator's own signal so a party that falls mid-wave loses at once.
fn settle_step(
    turns: &mut TurnCoordinator,
    waves: &mut WaveOrchestrator,
    ctx: &mut CombatContext<'_>,
    report: StepReport,
) {
    waves.on_deaths(ctx, &report.deaths);
    if waves.is_wiped() || report.signal == Some(TurnSignal::PartyWiped) {
        tracing::info!(target: "expedition::wave", "party wiped");
        turns.stand_down();
        waves.complete(ctx, false);
        return;
    }
    if report.signal == Some(TurnSignal::WaveCleared) {
        clear_wave(turns, waves, ctx);
    }
}
