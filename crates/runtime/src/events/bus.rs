//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use expedition_core::{EventCategory, SequencedEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// Turn window: open, timer, queue/confirm, close
    Turn,
    /// Resolution detail: outcomes, effects, deaths
    Action,
    /// Encounter and wave progression
    Wave,
}

impl From<EventCategory> for Topic {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::Turn => Topic::Turn,
            EventCategory::Action => Topic::Action,
            EventCategory::Wave => Topic::Wave,
        }
    }
}

/// Topic-based event bus
///
/// Every event goes to its topic channel and to a combined channel, so a
/// consumer that needs the full ordered stream does not have to merge topics.
#[derive(Clone)]
pub struct EventBus {
    turn: broadcast::Sender<SequencedEvent>,
    action: broadcast::Sender<SequencedEvent>,
    wave: broadcast::Sender<SequencedEvent>,
    all: broadcast::Sender<SequencedEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic. A zero
    /// capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turn: broadcast::channel(capacity).0,
            action: broadcast::channel(capacity).0,
            wave: broadcast::channel(capacity).0,
            all: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<SequencedEvent> {
        match topic {
            Topic::Turn => &self.turn,
            Topic::Action => &self.action,
            Topic::Wave => &self.wave,
        }
    }

    /// Publish an event to its topic
    pub fn publish(&self, event: SequencedEvent) {
        let topic = Topic::from(event.event.category());
        if self.sender(topic).send(event.clone()).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", %topic, "no subscribers");
        }
        let _ = self.all.send(event);
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SequencedEvent> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to every topic in publication order
    pub fn subscribe_all(&self) -> broadcast::Receiver<SequencedEvent> {
        self.all.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
