//! Topic-based event distribution for encounter events.

mod bus;

pub use bus::{EventBus, Topic};
pub use expedition_core::{CombatEvent, SequencedEvent};
