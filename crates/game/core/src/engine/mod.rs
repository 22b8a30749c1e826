//! Encounter engine: the turn state machine, wave progression and the
//! owning [`Encounter`] context that ties them to a host-driven clock.
//!
//! Nothing here reads wall time or performs I/O. Commands mutate the
//! encounter synchronously and [`Encounter::advance`] runs every transition
//! that falls inside the elapsed time, appending outbound events as it goes.

mod clock;
mod context;
mod encounter;
mod stats;
mod targeting;
mod turns;
mod waves;

pub use clock::Countdown;
pub use encounter::{Encounter, EncounterPhase, EncounterSnapshot};
pub use stats::{EncounterStats, ParticipantStats};
pub use targeting::resolve_target;
pub use turns::{
    ConfirmReceipt, ConfirmRejection, QueueReceipt, QueueRejection, QueuedAction, StepReport,
    TurnCoordinator, TurnPhase, TurnPoll, TurnSignal,
};
pub use waves::{
    EncounterStage, JoinReceipt, JoinRejection, Participant, StartError, WaveOrchestrator,
    WaveProgress,
};
