use std::collections::HashMap;

use crate::ability::AbilityDefinition;
use crate::state::CharacterClass;

/// Oracle providing ability definitions by command name.
pub trait AbilityOracle: Send + Sync {
    /// Case-insensitive lookup. A miss is a participant input error.
    fn lookup(&self, command: &str) -> Option<&AbilityDefinition>;

    fn is_empty(&self) -> bool;
}

/// Immutable ability registry built once at startup.
///
/// Registration order matters: when two definitions share a command name
/// (ignoring case), the first one registered wins and later ones are dropped.
#[derive(Clone, Debug, Default)]
pub struct AbilityCatalog {
    abilities: Vec<AbilityDefinition>,
    index: HashMap<String, usize>,
}

impl AbilityCatalog {
    pub fn from_definitions(definitions: impl IntoIterator<Item = AbilityDefinition>) -> Self {
        let mut catalog = Self::default();
        for definition in definitions {
            let key = definition.command.to_ascii_lowercase();
            if catalog.index.contains_key(&key) {
                tracing::debug!(
                    target: "expedition::catalog",
                    command = %definition.command,
                    "duplicate ability command ignored"
                );
                continue;
            }
            catalog.index.insert(key, catalog.abilities.len());
            catalog.abilities.push(definition);
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AbilityDefinition> {
        self.abilities.iter()
    }

    /// Abilities a class may queue, in registration order.
    pub fn for_class(&self, class: CharacterClass) -> impl Iterator<Item = &AbilityDefinition> {
        self.abilities
            .iter()
            .filter(move |ability| ability.required_class == Some(class))
    }
}

impl AbilityOracle for AbilityCatalog {
    fn lookup(&self, command: &str) -> Option<&AbilityDefinition> {
        self.index
            .get(&command.to_ascii_lowercase())
            .and_then(|&index| self.abilities.get(index))
    }

    fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityCategory;

    #[test]
    fn lookup_is_case_insensitive_and_first_wins() {
        let mut first = AbilityDefinition::new("Strike", AbilityCategory::Damage);
        first.flat_bonus = 1;
        let mut second = AbilityDefinition::new("strike", AbilityCategory::Damage);
        second.flat_bonus = 2;

        let catalog = AbilityCatalog::from_definitions([first, second]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("STRIKE").map(|a| a.flat_bonus), Some(1));
        assert!(catalog.lookup("smite").is_none());
    }

    #[test]
    fn for_class_filters_by_required_class() {
        let mut bolt = AbilityDefinition::new("bolt", AbilityCategory::Damage);
        bolt.required_class = Some(CharacterClass::Mage);
        let claw = AbilityDefinition::new("claw", AbilityCategory::Damage);
        let catalog = AbilityCatalog::from_definitions([bolt, claw]);

        let mage: Vec<_> = catalog.for_class(CharacterClass::Mage).map(|a| &a.command).collect();
        assert_eq!(mage, ["bolt"]);
    }
}
