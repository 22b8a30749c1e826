//! Encounter worker that owns the authoritative [`Encounter`].
//!
//! Receives commands from [`crate::EncounterHandle`], advances the encounter
//! clock on a fixed interval, publishes drained events to the [`EventBus`],
//! and flushes profile writebacks to the [`ProfileStore`].

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use expedition_content::ContentPack;
use expedition_core::{
    CharacterClass, ConfirmReceipt, Difficulty, Encounter, EncounterSnapshot, JoinReceipt,
    JoinRejection, ParticipantId, PcgRng, QueueReceipt,
};

use crate::api::{Rejection, Result, RuntimeError};
use crate::events::EventBus;
use crate::repository::{ProfileStore, StoredProfile};

/// Commands that can be sent to the encounter worker
pub enum Command {
    Start {
        difficulty: Difficulty,
        reply: oneshot::Sender<Result<()>>,
    },
    Join {
        participant: ParticipantId,
        display_name: String,
        /// Class chosen with the join; required for first-time players.
        class: Option<CharacterClass>,
        position: Option<u8>,
        reply: oneshot::Sender<Result<JoinReceipt>>,
    },
    Queue {
        participant: ParticipantId,
        ability: String,
        target: Option<String>,
        reply: oneshot::Sender<Result<QueueReceipt>>,
    },
    Confirm {
        participant: ParticipantId,
        reply: oneshot::Sender<Result<ConfirmReceipt>>,
    },
    Snapshot {
        reply: oneshot::Sender<EncounterSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Background task that serialises every encounter mutation.
///
/// Commands are applied one at a time, so concurrent senders never observe a
/// half-applied queue or confirm.
pub struct EncounterWorker {
    encounter: Encounter,
    content: Arc<ContentPack>,
    rng: PcgRng,
    store: Arc<dyn ProfileStore>,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    tick: std::time::Duration,
    death_lockout: chrono::Duration,
    /// Drawn fresh on every successful start; keys reward crediting across
    /// restarts of the host.
    encounter_key: u64,
}

impl EncounterWorker {
    pub fn new(
        encounter: Encounter,
        content: Arc<ContentPack>,
        store: Arc<dyn ProfileStore>,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        tick: std::time::Duration,
        death_lockout: chrono::Duration,
    ) -> Self {
        Self {
            encounter,
            content,
            rng: PcgRng,
            store,
            command_rx,
            event_bus,
            tick,
            death_lockout,
            encounter_key: 0,
        }
    }

    /// Main worker loop. Exits on [`Command::Shutdown`] or once every handle
    /// has been dropped; either way a live encounter is abandoned and its
    /// survivors written back first.
    pub async fn run(mut self) {
        let mut ticker = time::interval(self.tick.max(std::time::Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Shutdown { reply }) => {
                        info!(target: "runtime::worker", "shutdown requested");
                        self.wind_down().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        self.wind_down().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let elapsed = now.duration_since(last_tick);
                    last_tick = now;
                    let env = self.content.env(&self.rng);
                    self.encounter.advance(env, elapsed);
                    self.flush().await;
                }
            }
        }

        debug!(target: "runtime::worker", "encounter worker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start { difficulty, reply } => {
                let result = self.handle_start(difficulty);
                self.flush().await;
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "start reply channel closed");
                }
            }
            Command::Join {
                participant,
                display_name,
                class,
                position,
                reply,
            } => {
                let result = self
                    .handle_join(participant, display_name, class, position)
                    .await;
                self.flush().await;
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "join reply channel closed");
                }
            }
            Command::Queue {
                participant,
                ability,
                target,
                reply,
            } => {
                let env = self.content.env(&self.rng);
                let result = self
                    .encounter
                    .queue_action(env, &participant, &ability, target.as_deref())
                    .map_err(|reason| self.reject(&participant, reason));
                self.flush().await;
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "queue reply channel closed");
                }
            }
            Command::Confirm { participant, reply } => {
                let env = self.content.env(&self.rng);
                let result = self
                    .encounter
                    .confirm_action(env, &participant)
                    .map_err(|reason| self.reject(&participant, reason));
                self.flush().await;
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "confirm reply channel closed");
                }
            }
            Command::Snapshot { reply } => {
                if reply.send(self.encounter.snapshot()).is_err() {
                    debug!(target: "runtime::worker", "snapshot reply channel closed");
                }
            }
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn wind_down(&mut self) {
        let env = self.content.env(&self.rng);
        if self.encounter.abandon(env, "host shutting down") {
            info!(target: "runtime::worker", "live encounter abandoned");
        }
        self.flush().await;
    }

    fn handle_start(&mut self, difficulty: Difficulty) -> Result<()> {
        let env = self.content.env(&self.rng);
        self.encounter.start(env, difficulty)?;
        self.encounter_key = rand::random();
        info!(
            target: "runtime::worker",
            %difficulty,
            key = self.encounter_key,
            "encounter opened"
        );
        Ok(())
    }

    async fn handle_join(
        &mut self,
        participant: ParticipantId,
        display_name: String,
        class: Option<CharacterClass>,
        position: Option<u8>,
    ) -> Result<JoinReceipt> {
        let stored = self.store.load(&participant).await?;
        let now = Utc::now();

        let mut stored = match stored {
            Some(stored) => stored,
            None => {
                let Some(class) = class else {
                    return Err(Rejection::new(display_name, JoinRejection::NoClass).into());
                };
                StoredProfile::fresh(participant.clone(), display_name.clone(), class)
            }
        };

        if let Some(remaining) = stored.lockout_remaining(now) {
            let minutes = (remaining.num_seconds().max(0) as u64).div_ceil(60);
            return Err(Rejection::new(display_name, JoinRejection::LockedOut { minutes }).into());
        }

        stored.profile.display_name = display_name.clone();
        if let Some(class) = class {
            stored.profile.class = Some(class);
        }

        let env = self.content.env(&self.rng);
        let receipt = self
            .encounter
            .join(env, stored.profile.clone(), position)
            .map_err(|reason| Rejection::new(display_name, reason))?;
        self.store.save(&stored).await?;
        Ok(receipt)
    }

    /// Pairs a rejection with the participant's display name, falling back
    /// to the raw id for people outside the encounter.
    fn reject(
        &self,
        participant: &ParticipantId,
        reason: impl Into<crate::api::RejectionReason>,
    ) -> RuntimeError {
        let name = self
            .encounter
            .waves()
            .participants()
            .iter()
            .find(|p| &p.profile.id == participant)
            .map(|p| p.profile.display_name.clone())
            .unwrap_or_else(|| participant.to_string());
        Rejection::new(name, reason).into()
    }

    /// Publishes pending events and persists pending writebacks.
    async fn flush(&mut self) {
        for event in self.encounter.drain_events() {
            self.event_bus.publish(event);
        }

        let writebacks = self.encounter.drain_writebacks();
        if writebacks.is_empty() {
            return;
        }
        let now = Utc::now();
        for writeback in writebacks {
            let stored = match self.store.load(&writeback.participant).await {
                Ok(Some(stored)) => stored,
                Ok(None) => {
                    warn!(
                        target: "runtime::worker",
                        participant = %writeback.participant,
                        "writeback for unknown profile"
                    );
                    continue;
                }
                Err(e) => {
                    error!(
                        target: "runtime::worker",
                        participant = %writeback.participant,
                        error = %e,
                        "failed to load profile for writeback"
                    );
                    continue;
                }
            };
            let mut stored = stored;
            stored.apply_writeback(&writeback, self.encounter_key, now, self.death_lockout);
            if let Err(e) = self.store.save(&stored).await {
                error!(
                    target: "runtime::worker",
                    participant = %writeback.participant,
                    error = %e,
                    "failed to persist writeback"
                );
            } else {
                debug!(
                    target: "runtime::worker",
                    participant = %writeback.participant,
                    died = writeback.died,
                    rewarded = writeback.reward.is_some(),
                    "writeback persisted"
                );
            }
        }
    }
}
