//! Cloneable façade for issuing commands to the encounter worker.
//!
//! [`EncounterHandle`] hides channel plumbing and offers async helpers for
//! each participant command, plus event subscriptions by topic.
use tokio::sync::{broadcast, mpsc, oneshot};

use expedition_core::{
    CharacterClass, ConfirmReceipt, Difficulty, EncounterSnapshot, JoinReceipt, ParticipantId,
    QueueReceipt, SequencedEvent,
};

use super::errors::{Result, RuntimeError};
use crate::events::{EventBus, Topic};
use crate::workers::Command;

/// Client-facing handle to the live encounter.
///
/// Safe to clone into as many tasks as there are command sources; the worker
/// applies commands in arrival order.
#[derive(Clone)]
pub struct EncounterHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl EncounterHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Open a new encounter for joins.
    pub async fn start_encounter(&self, difficulty: Difficulty) -> Result<()> {
        self.request(|reply| Command::Start { difficulty, reply })
            .await?
    }

    /// Join the open encounter. `class` is only needed the first time a
    /// participant plays; `position` defaults to the back of the party.
    pub async fn join(
        &self,
        participant: impl Into<ParticipantId>,
        display_name: impl Into<String>,
        class: Option<CharacterClass>,
        position: Option<u8>,
    ) -> Result<JoinReceipt> {
        let participant = participant.into();
        let display_name = display_name.into();
        self.request(|reply| Command::Join {
            participant,
            display_name,
            class,
            position,
            reply,
        })
        .await?
    }

    /// Queue (or replace) this turn's action.
    pub async fn queue_action(
        &self,
        participant: impl Into<ParticipantId>,
        ability: impl Into<String>,
        target: Option<String>,
    ) -> Result<QueueReceipt> {
        let participant = participant.into();
        let ability = ability.into();
        self.request(|reply| Command::Queue {
            participant,
            ability,
            target,
            reply,
        })
        .await?
    }

    /// Lock in the queued action.
    pub async fn confirm_action(
        &self,
        participant: impl Into<ParticipantId>,
    ) -> Result<ConfirmReceipt> {
        let participant = participant.into();
        self.request(|reply| Command::Confirm { participant, reply })
            .await?
    }

    /// Read-only view of the encounter.
    pub async fn snapshot(&self) -> Result<EncounterSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Turn window open/close, timer, queue and confirm
    /// - `Topic::Action` - Resolved actions, status effects, deaths
    /// - `Topic::Wave` - Encounter lifecycle and wave progression
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SequencedEvent> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to every event in publication order
    pub fn subscribe_all(&self) -> broadcast::Receiver<SequencedEvent> {
        self.event_bus.subscribe_all()
    }

    /// Ask the worker to stop. Other handles fail with
    /// [`RuntimeError::CommandChannelClosed`] afterwards.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}
