//! Equipment slots and the bonuses they contribute to the combat snapshot.
//!
//! Hands follow a main-hand/off-hand model: a two-handed weapon fills the
//! main hand and keeps the off hand empty, and a second one-handed weapon in
//! the off hand (dual wielding) is limited to classes trained for it.

use super::{Attributes, CharacterClass};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Handedness {
    OneHanded,
    TwoHanded,
    /// Shields, foci, quivers: off hand only.
    OffHand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ItemKind {
    Weapon(Handedness),
    Helmet,
    ChestArmor,
    LegArmor,
    ArmArmor,
    Boots,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EquipSlot {
    Head,
    Chest,
    Legs,
    Arms,
    Feet,
    MainHand,
    OffHand,
}

/// Which hand a one-handed weapon should go in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hand {
    #[default]
    Main,
    Off,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bonuses: Attributes,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_bonus: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub defense_bonus: i32,
    /// Empty means any class.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allowed_classes: Vec<CharacterClass>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bonuses: Attributes::default(),
            damage_bonus: 0,
            defense_bonus: 0,
            allowed_classes: Vec::new(),
        }
    }

    pub fn is_two_handed(&self) -> bool {
        self.kind == ItemKind::Weapon(Handedness::TwoHanded)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EquipError {
    #[error("{class} cannot use {item}")]
    ClassRestricted { item: String, class: CharacterClass },

    #[error("{class} cannot dual wield")]
    NoDualWield { class: CharacterClass },

    #[error("{item} needs a free off hand, but a two-handed weapon is equipped")]
    HandsFull { item: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Equipment {
    pub head: Option<Item>,
    pub chest: Option<Item>,
    pub legs: Option<Item>,
    pub arms: Option<Item>,
    pub feet: Option<Item>,
    pub main_hand: Option<Item>,
    pub off_hand: Option<Item>,
}

impl Equipment {
    /// Equips `item` for a character of `class`, returning whatever it
    /// displaced. `hand` only matters for one-handed weapons.
    pub fn equip(
        &mut self,
        item: Item,
        class: CharacterClass,
        hand: Hand,
    ) -> Result<Vec<Item>, EquipError> {
        if !item.allowed_classes.is_empty() && !item.allowed_classes.contains(&class) {
            return Err(EquipError::ClassRestricted {
                item: item.name,
                class,
            });
        }

        let mut displaced = Vec::new();
        match item.kind {
            ItemKind::Helmet => displaced.extend(self.head.replace(item)),
            ItemKind::ChestArmor => displaced.extend(self.chest.replace(item)),
            ItemKind::LegArmor => displaced.extend(self.legs.replace(item)),
            ItemKind::ArmArmor => displaced.extend(self.arms.replace(item)),
            ItemKind::Boots => displaced.extend(self.feet.replace(item)),
            ItemKind::Weapon(Handedness::TwoHanded) => {
                displaced.extend(self.main_hand.replace(item));
                displaced.extend(self.off_hand.take());
            }
            ItemKind::Weapon(Handedness::OffHand) => {
                if self.main_hand.as_ref().is_some_and(Item::is_two_handed) {
                    return Err(EquipError::HandsFull { item: item.name });
                }
                displaced.extend(self.off_hand.replace(item));
            }
            ItemKind::Weapon(Handedness::OneHanded) => match hand {
                Hand::Main => {
                    displaced.extend(self.main_hand.replace(item));
                }
                Hand::Off => {
                    if !class.can_dual_wield() {
                        return Err(EquipError::NoDualWield { class });
                    }
                    if self.main_hand.as_ref().is_some_and(Item::is_two_handed) {
                        displaced.extend(self.main_hand.take());
                    }
                    displaced.extend(self.off_hand.replace(item));
                }
            },
        }
        Ok(displaced)
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<Item> {
        match slot {
            EquipSlot::Head => self.head.take(),
            EquipSlot::Chest => self.chest.take(),
            EquipSlot::Legs => self.legs.take(),
            EquipSlot::Arms => self.arms.take(),
            EquipSlot::Feet => self.feet.take(),
            EquipSlot::MainHand => self.main_hand.take(),
            EquipSlot::OffHand => self.off_hand.take(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        [
            &self.head,
            &self.chest,
            &self.legs,
            &self.arms,
            &self.feet,
            &self.main_hand,
            &self.off_hand,
        ]
        .into_iter()
        .flatten()
    }

    pub fn attribute_bonus(&self) -> Attributes {
        self.iter()
            .fold(Attributes::default(), |total, item| total.plus(&item.bonuses))
    }

    pub fn defense_bonus(&self) -> i32 {
        self.iter().map(|item| item.defense_bonus).sum()
    }

    pub fn damage_bonus(&self) -> i32 {
        self.iter().map(|item| item.damage_bonus).sum()
    }
}
