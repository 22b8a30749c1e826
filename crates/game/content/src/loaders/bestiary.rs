//! Bestiary and difficulty table loader.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use expedition_core::{
    AbilityDefinition, Bestiary, CombatConfig, DifficultyProfile, EnemyTemplate,
};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Bestiary structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestiaryFile {
    pub enemies: Vec<EnemyTemplate>,
    pub difficulties: Vec<DifficultyProfile>,
}

/// Loader for enemy templates and per-difficulty wave tables.
pub struct BestiaryLoader;

impl BestiaryLoader {
    pub fn load(path: &Path) -> LoadResult<Bestiary> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parses a bestiary. Pools must name known enemies and every enemy must
    /// fit the ability slot limit; a wave table is required per difficulty
    /// listed.
    pub fn parse(content: &str) -> LoadResult<Bestiary> {
        let file: BestiaryFile = ron::from_str(content).context("failed to parse bestiary RON")?;

        let mut names = HashSet::new();
        for enemy in &file.enemies {
            if !names.insert(enemy.name.as_str()) {
                bail!("duplicate enemy '{}'", enemy.name);
            }
            if enemy.abilities.len() > CombatConfig::MAX_ENEMY_ABILITIES {
                bail!(
                    "enemy '{}' has {} abilities (max {})",
                    enemy.name,
                    enemy.abilities.len(),
                    CombatConfig::MAX_ENEMY_ABILITIES
                );
            }
            if enemy.abilities.is_empty() {
                tracing::warn!(
                    target: "content::bestiary",
                    enemy = %enemy.name,
                    "enemy has no abilities and will idle"
                );
            }
        }

        let mut difficulties = HashSet::new();
        for table in &file.difficulties {
            if !difficulties.insert(table.difficulty) {
                bail!("difficulty {} is listed twice", table.difficulty);
            }
            if table.waves.is_empty() {
                bail!("difficulty {} has no waves", table.difficulty);
            }
            for name in table.enemy_pool.iter().chain(&table.boss_pool) {
                if !names.contains(name.as_str()) {
                    bail!("difficulty {} names unknown enemy '{name}'", table.difficulty);
                }
            }
            if table.enemy_pool.is_empty() {
                tracing::warn!(
                    target: "content::bestiary",
                    difficulty = %table.difficulty,
                    "enemy pool is empty; waves will only contain bosses"
                );
            }
        }

        Ok(Bestiary::new(file.enemies, file.difficulties))
    }

    /// Warns about enemy abilities missing from the catalog. Such enemies
    /// idle on the turns they pick the missing ability.
    pub fn check_abilities(bestiary: &Bestiary, abilities: &[AbilityDefinition]) -> usize {
        let known: HashSet<String> = abilities
            .iter()
            .map(|a| a.command.to_ascii_lowercase())
            .collect();
        let mut missing = 0;
        for enemy in bestiary.enemies() {
            for command in &enemy.abilities {
                if !known.contains(&command.to_ascii_lowercase()) {
                    tracing::warn!(
                        target: "content::bestiary",
                        enemy = %enemy.name,
                        ability = %command,
                        "enemy ability not in catalog"
                    );
                    missing += 1;
                }
            }
        }
        missing
    }
}
