//! Read-only collaborators the engine consults but never mutates.
//!
//! Oracles expose the ability catalog, the bestiary with its difficulty
//! tables, and deterministic randomness. [`CombatEnv`] bundles them so every
//! encounter operation receives the same injected services.
mod abilities;
mod bestiary;
mod rng;

pub use abilities::{AbilityCatalog, AbilityOracle};
pub use bestiary::{
    Bestiary, BestiaryOracle, Difficulty, DifficultyProfile, EnemyRole, EnemyTemplate, WaveSpec,
};
pub use rng::{Dice, PcgRng, RngOracle, RollContext, compute_seed};

/// Aggregates the read-only oracles required by an encounter.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    pub abilities: &'a dyn AbilityOracle,
    pub bestiary: &'a dyn BestiaryOracle,
    pub rng: &'a dyn RngOracle,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        abilities: &'a dyn AbilityOracle,
        bestiary: &'a dyn BestiaryOracle,
        rng: &'a dyn RngOracle,
    ) -> Self {
        Self {
            abilities,
            bestiary,
            rng,
        }
    }
}
