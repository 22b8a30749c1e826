//! Worker tasks that back the runtime orchestration.
//!
//! A single encounter worker owns the live [`expedition_core::Encounter`];
//! everything else talks to it through [`Command`]s.

mod encounter;

pub use encounter::{Command, EncounterWorker};
