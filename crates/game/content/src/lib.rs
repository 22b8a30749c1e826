//! Data-driven content for expeditions.
//!
//! Abilities, enemy templates, difficulty tables and combat tuning are
//! authored as RON/TOML and loaded once at startup into the immutable
//! oracle types `expedition-core` consults. Content never appears in
//! encounter state.
//!
//! A default pack is embedded in the crate; hosts can point a
//! [`ContentFactory`] at a directory to override it.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{AbilityLoader, BestiaryLoader, ConfigLoader, ContentFactory};

use expedition_core::{AbilityCatalog, Bestiary, CombatConfig, CombatEnv, RngOracle};

/// Everything an encounter host needs from content.
#[derive(Clone, Debug, Default)]
pub struct ContentPack {
    pub abilities: AbilityCatalog,
    pub bestiary: Bestiary,
    pub config: CombatConfig,
}

impl ContentPack {
    pub fn env<'a>(&'a self, rng: &'a dyn RngOracle) -> CombatEnv<'a> {
        CombatEnv::new(&self.abilities, &self.bestiary, rng)
    }
}
