//! Repository contract for saving and loading participant profiles.

use async_trait::async_trait;

use expedition_core::ParticipantId;

use super::{Result, StoredProfile};

/// Source of truth for participant profiles outside combat.
///
/// The encounter worker calls [`ProfileStore::load`] once per join and
/// [`ProfileStore::save`] for every writeback it flushes.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a profile by participant id. `None` means a first-time player.
    async fn load(&self, participant: &ParticipantId) -> Result<Option<StoredProfile>>;

    /// Insert or replace a profile.
    async fn save(&self, profile: &StoredProfile) -> Result<()>;

    /// Number of stored profiles.
    async fn count(&self) -> Result<usize>;
}
