//! Combat-time state owned by a live encounter.
//!
//! [`Roster`] is the single owner of every [`CombatantState`]; components
//! borrow it for the duration of one operation and never hold references
//! across turns. Profiles ([`ParticipantProfile`]) are the read-once input
//! and [`ProfileWriteback`] the write-once output at encounter boundaries.
mod combatant;
mod equipment;
mod ids;
mod profile;
mod resources;
mod roster;
mod stats;
mod status;

pub use combatant::{CombatantState, EnemyBounty, HitOutcome};
pub use equipment::{EquipError, EquipSlot, Equipment, Hand, Handedness, Item, ItemKind};
pub use ids::{CombatantId, ParticipantId, Side};
pub use profile::{ParticipantProfile, ProfileWriteback, Reward, StoredResources};
pub use resources::{AffordError, AttackKind, ClassResources, CooldownSlot, EnemyCooldowns, FighterStance};
pub use roster::Roster;
pub use stats::{Attributes, CharacterClass, CombatStats};
pub use status::{EffectTick, StatusEffectInstance, StatusEffects};
