//! Async host for a single live expedition encounter.
//!
//! This crate wires the deterministic [`expedition_core::Encounter`] into a
//! tokio runtime: one worker task owns the encounter, many command sources
//! talk to it through [`EncounterHandle`], the clock ticks on an interval,
//! and events fan out over a topic [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator, builder and config
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`repository`] persists participant profiles
//! - `workers` keeps the background task internal to the crate
pub mod api;
pub mod events;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{EncounterHandle, Rejection, RejectionReason, Result, RuntimeError};
pub use events::{CombatEvent, EventBus, SequencedEvent, Topic};
pub use repository::{
    FileProfileStore, InMemoryProfileStore, ProfileStore, RepositoryError, StoredProfile,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
