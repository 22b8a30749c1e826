//! Deterministic combat rules for audience-driven party expeditions.
//!
//! `expedition-core` owns the turn state machine, action resolution, enemy
//! decisions and wave progression. It performs no I/O and never reads the
//! wall clock: hosts drive time through [`Encounter::advance`], supply
//! read-only data through [`CombatEnv`], and forward the drained
//! [`SequencedEvent`]s to whatever presents them.
pub mod ability;
pub mod ai;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod events;
pub mod resolve;
pub mod state;

#[cfg(test)]
mod test_support;

pub use ability::{
    AbilityCategory, AbilityDefinition, EffectTemplate, ResourceCost, ScalingStat, TargetFlags,
    TargetKind, TargetRule,
};
pub use ai::{EnemyDecision, EnemyDecisionProcedure, EnemyIdleReason};
pub use config::{CombatConfig, ConfigError};
pub use engine::{
    ConfirmReceipt, ConfirmRejection, Encounter, EncounterPhase, EncounterSnapshot,
    EncounterStage, JoinReceipt, JoinRejection, QueueReceipt, QueueRejection, QueuedAction,
    StartError, TurnPhase,
};
pub use env::{
    AbilityCatalog, AbilityOracle, Bestiary, BestiaryOracle, CombatEnv, Difficulty,
    DifficultyProfile, EnemyRole, EnemyTemplate, PcgRng, RngOracle, WaveSpec,
};
pub use error::{ErrorSeverity, GameError};
pub use events::{
    CombatEvent, CombatantView, EncounterSummary, EventCategory, EventLog, ParticipantSummary,
    SequencedEvent,
};
pub use resolve::{ActionOutcome, ActionResolver, ResolveAbort, TargetEffect, TargetOutcome};
pub use state::{
    Attributes, CharacterClass, ClassResources, CombatStats, CombatantId, CombatantState,
    Equipment, FighterStance, Item, ItemKind, ParticipantId, ParticipantProfile,
    ProfileWriteback, Reward, Roster, Side, StoredResources,
};
