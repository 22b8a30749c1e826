//! Ability catalog loader.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use expedition_core::AbilityDefinition;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Ability catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilityFile {
    pub abilities: Vec<AbilityDefinition>,
}

/// Loader for ability definitions from RON files.
pub struct AbilityLoader;

impl AbilityLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilityDefinition>> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Parses a catalog and rejects definitions the engine could never use:
    /// blank or duplicate commands, empty AOE groups and inverted position
    /// ranges.
    pub fn parse(content: &str) -> LoadResult<Vec<AbilityDefinition>> {
        let file: AbilityFile =
            ron::from_str(content).context("failed to parse ability catalog RON")?;

        let mut seen = HashSet::new();
        for ability in &file.abilities {
            if ability.command.trim().is_empty() {
                bail!("ability '{}' has no command", ability.name);
            }
            if !seen.insert(ability.command.to_ascii_lowercase()) {
                bail!("duplicate ability command '{}'", ability.command);
            }
            if ability.target.aoe_targets == 0 {
                bail!("ability '{}' must hit at least one target", ability.command);
            }
            if ability.target.min_position > ability.target.max_position {
                bail!(
                    "ability '{}' reaches positions {}..={}",
                    ability.command,
                    ability.target.min_position,
                    ability.target.max_position
                );
            }
        }

        tracing::debug!(
            target: "content::abilities",
            count = file.abilities.len(),
            "ability catalog parsed"
        );
        Ok(file.abilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expedition_core::{AbilityCategory, CharacterClass, ScalingStat, TargetKind};

    #[test]
    fn parses_sparse_definitions_with_defaults() {
        let abilities = AbilityLoader::parse(
            r#"(abilities: [
                (name: "Mend", command: "mend", required_class: Some(Cleric), category: Heal,
                 target: (allowed: "ALLY"), scaling_stat: Willpower, flat_bonus: 10),
                (name: "War Cry", command: "warcry", category: Buff,
                 target: (kind: SelfOnly, allowed: "ALLY"), cooldown: 3),
            ])"#,
        )
        .unwrap();

        assert_eq!(abilities.len(), 2);
        let mend = &abilities[0];
        assert_eq!(mend.required_class, Some(CharacterClass::Cleric));
        assert_eq!(mend.category, AbilityCategory::Heal);
        assert!(mend.target.can_target_allies());
        assert!(!mend.target.can_target_enemies());
        assert_eq!(mend.multiplier, 1.0);
        assert_eq!(abilities[1].target.kind, TargetKind::SelfOnly);
        assert_eq!(abilities[1].required_class, None);
    }

    #[test]
    fn unknown_scaling_stat_is_kept_as_unrecognized() {
        let abilities =
            AbilityLoader::parse(r#"(abilities: [(command: "odd", scaling_stat: Luck)])"#).unwrap();
        assert_eq!(abilities[0].scaling_stat, ScalingStat::Unrecognized);
    }

    #[test]
    fn duplicate_commands_are_rejected() {
        let err = AbilityLoader::parse(
            r#"(abilities: [(command: "strike"), (command: "Strike")])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abilities.ron");
        std::fs::write(&path, r#"(abilities: [(name: "Claw", command: "claw")])"#).unwrap();

        let abilities = AbilityLoader::load(&path).unwrap();
        assert_eq!(abilities[0].name, "Claw");
    }
}
