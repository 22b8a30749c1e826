//! Outbound events for the presentation and notification layers.
//!
//! The encounter appends events to an [`EventLog`] as it changes state; the
//! host drains them after every command or clock advance and forwards them in
//! order. Each event carries a per-encounter sequence number and belongs to
//! one [`EventCategory`], which the runtime maps onto its bus topics.

use crate::env::Difficulty;
use crate::resolve::ActionOutcome;
use crate::state::{CharacterClass, CombatantId, CombatantState, ParticipantId, Reward, Side};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EventCategory {
    /// Turn window: open, timer, queue/confirm, close.
    Turn,
    /// Resolution detail: outcomes, effects, deaths.
    Action,
    /// Encounter and wave progression.
    Wave,
}

/// Read-only view of a combatant for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantView {
    pub id: CombatantId,
    pub name: String,
    pub side: Side,
    pub position: u8,
    pub class: Option<CharacterClass>,
    pub health: i32,
    pub max_health: i32,
    pub alive: bool,
    pub effects: Vec<String>,
}

impl From<&CombatantState> for CombatantView {
    fn from(state: &CombatantState) -> Self {
        Self {
            id: state.id,
            name: state.name.clone(),
            side: state.side,
            position: state.position,
            class: state.class,
            health: state.health(),
            max_health: state.max_health(),
            alive: state.is_alive(),
            effects: state.effects().iter().map(|e| e.name.clone()).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantSummary {
    pub participant: ParticipantId,
    pub name: String,
    pub actions: u32,
    pub damage_dealt: i64,
    pub healing_done: i64,
    pub died: bool,
    pub reward: Reward,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterSummary {
    pub victory: bool,
    pub difficulty: Difficulty,
    pub waves_cleared: usize,
    pub total_waves: usize,
    pub enemies_defeated: u32,
    pub participants: Vec<ParticipantSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "event", rename_all = "snake_case")
)]
#[strum(serialize_all = "snake_case")]
pub enum CombatEvent {
    EncounterOpened {
        difficulty: Difficulty,
        total_waves: usize,
    },
    ParticipantJoined {
        participant: ParticipantId,
        name: String,
        class: CharacterClass,
        position: u8,
        /// Joined after the expedition started.
        late: bool,
    },
    PositionSwapped {
        participant: ParticipantId,
        from: u8,
        to: u8,
    },
    EncounterStarted {
        participants: usize,
    },
    EncounterCancelled {
        reason: String,
    },
    WaveStarted {
        /// One-based wave number.
        wave: usize,
        total_waves: usize,
        enemies: Vec<CombatantView>,
    },
    TurnOpened {
        turn: u32,
        seconds: u64,
    },
    TurnTimer {
        turn: u32,
        seconds_remaining: u64,
    },
    ActionQueued {
        participant: ParticipantId,
        ability: String,
        target: String,
    },
    ActionConfirmed {
        participant: ParticipantId,
    },
    DefaultActionAssigned {
        participant: ParticipantId,
        ability: String,
        target: String,
    },
    TurnClosed {
        turn: u32,
        actions: usize,
    },
    ActionResolved {
        caster_name: String,
        outcome: ActionOutcome,
    },
    ActionSkipped {
        caster: CombatantId,
        ability: String,
        reason: String,
    },
    StatusApplied {
        target: CombatantId,
        effect: String,
    },
    StatusTicked {
        target: CombatantId,
        effect: String,
        damage: i32,
        healed: i32,
    },
    StatusExpired {
        target: CombatantId,
        effect: String,
    },
    ResourceRegenerated {
        combatant: CombatantId,
        resource: String,
        amount: i32,
    },
    CombatantDied {
        combatant: CombatantId,
        name: String,
        side: Side,
    },
    PositionsCompacted {
        moves: Vec<(CombatantId, u8)>,
    },
    EnemyIdle {
        enemy: CombatantId,
        reason: String,
    },
    WaveCleared {
        wave: usize,
        enemies_defeated: u32,
    },
    RestStarted {
        seconds: u64,
        next_wave: usize,
    },
    EncounterCompleted {
        summary: EncounterSummary,
    },
}

impl CombatEvent {
    pub fn category(&self) -> EventCategory {
        match self {
            Self::TurnOpened { .. }
            | Self::TurnTimer { .. }
            | Self::ActionQueued { .. }
            | Self::ActionConfirmed { .. }
            | Self::DefaultActionAssigned { .. }
            | Self::TurnClosed { .. } => EventCategory::Turn,

            Self::ActionResolved { .. }
            | Self::ActionSkipped { .. }
            | Self::StatusApplied { .. }
            | Self::StatusTicked { .. }
            | Self::StatusExpired { .. }
            | Self::ResourceRegenerated { .. }
            | Self::CombatantDied { .. }
            | Self::PositionsCompacted { .. }
            | Self::EnemyIdle { .. } => EventCategory::Action,

            Self::EncounterOpened { .. }
            | Self::ParticipantJoined { .. }
            | Self::PositionSwapped { .. }
            | Self::EncounterStarted { .. }
            | Self::EncounterCancelled { .. }
            | Self::WaveStarted { .. }
            | Self::WaveCleared { .. }
            | Self::RestStarted { .. }
            | Self::EncounterCompleted { .. } => EventCategory::Wave,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequencedEvent {
    pub seq: u64,
    pub event: CombatEvent,
}

/// Append-only outbox with a monotonically increasing sequence number.
///
/// The sequence keeps counting across drains, so consumers can detect gaps.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    next_seq: u64,
    pending: Vec<SequencedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CombatEvent) {
        tracing::trace!(
            target: "expedition::events",
            seq = self.next_seq,
            kind = event.name(),
            "event"
        );
        self.pending.push(SequencedEvent {
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    pub fn drain(&mut self) -> Vec<SequencedEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[SequencedEvent] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_survives_drains() {
        let mut log = EventLog::new();
        log.push(CombatEvent::EncounterStarted { participants: 2 });
        log.push(CombatEvent::TurnOpened { turn: 1, seconds: 45 });
        let first = log.drain();
        log.push(CombatEvent::TurnClosed { turn: 1, actions: 2 });
        let second = log.drain();

        let seqs: Vec<_> = first.iter().chain(&second).map(|e| e.seq).collect();
        assert_eq!(seqs, [0, 1, 2]);
        assert!(log.is_empty());
    }

    #[test]
    fn events_map_to_categories() {
        let opened = CombatEvent::TurnOpened { turn: 1, seconds: 45 };
        let died = CombatEvent::CombatantDied {
            combatant: CombatantId(3),
            name: "Goblin".into(),
            side: Side::Enemy,
        };
        let cleared = CombatEvent::WaveCleared {
            wave: 1,
            enemies_defeated: 3,
        };

        assert_eq!(opened.category(), EventCategory::Turn);
        assert_eq!(died.category(), EventCategory::Action);
        assert_eq!(cleared.category(), EventCategory::Wave);
        assert_eq!(cleared.name(), "wave_cleared");
    }
}
