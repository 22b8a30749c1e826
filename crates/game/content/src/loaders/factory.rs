//! Content factory for building a [`ContentPack`] from data files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use expedition_core::{AbilityCatalog, AbilityDefinition, Bestiary, CombatConfig};

use crate::ContentPack;
use crate::loaders::{AbilityLoader, BestiaryLoader, ConfigLoader, LoadResult};

const EMBEDDED_ABILITIES: &str = include_str!("../../data/abilities.ron");
const EMBEDDED_BESTIARY: &str = include_str!("../../data/bestiary.ron");
const EMBEDDED_CONFIG: &str = include_str!("../../data/config.toml");

/// Content factory that loads all game content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional, defaults apply when absent)
/// ├── abilities.ron
/// └── bestiary.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The content pack compiled into the binary.
    pub fn embedded() -> LoadResult<ContentPack> {
        let abilities = AbilityLoader::parse(EMBEDDED_ABILITIES).context("embedded abilities")?;
        let bestiary = BestiaryLoader::parse(EMBEDDED_BESTIARY).context("embedded bestiary")?;
        let config = ConfigLoader::parse(EMBEDDED_CONFIG).context("embedded config")?;
        Ok(assemble(abilities, bestiary, config))
    }

    /// Load combat tuning from `config.toml`, falling back to defaults when
    /// the file does not exist.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(
                target: "content::factory",
                path = %path.display(),
                "no config file; using defaults"
            );
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    pub fn load_abilities(&self) -> LoadResult<Vec<AbilityDefinition>> {
        AbilityLoader::load(&self.data_dir.join("abilities.ron"))
    }

    pub fn load_bestiary(&self) -> LoadResult<Bestiary> {
        BestiaryLoader::load(&self.data_dir.join("bestiary.ron"))
    }

    pub fn load_all(&self) -> LoadResult<ContentPack> {
        let abilities = self.load_abilities()?;
        let bestiary = self.load_bestiary()?;
        let config = self.load_config()?;
        tracing::info!(
            target: "content::factory",
            dir = %self.data_dir.display(),
            abilities = abilities.len(),
            enemies = bestiary.enemies().len(),
            "content loaded"
        );
        Ok(assemble(abilities, bestiary, config))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn assemble(
    abilities: Vec<AbilityDefinition>,
    bestiary: Bestiary,
    config: CombatConfig,
) -> ContentPack {
    BestiaryLoader::check_abilities(&bestiary, &abilities);
    ContentPack {
        abilities: AbilityCatalog::from_definitions(abilities),
        bestiary,
        config,
    }
}
