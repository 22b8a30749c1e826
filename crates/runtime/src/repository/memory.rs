//! In-memory profile store for tests and ephemeral hosts.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use expedition_core::ParticipantId;

use super::{ProfileStore, Result, StoredProfile};

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<ParticipantId, StoredProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with profiles.
    pub fn with_profiles(profiles: impl IntoIterator<Item = StoredProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|profile| (profile.id().clone(), profile))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load(&self, participant: &ParticipantId) -> Result<Option<StoredProfile>> {
        Ok(self.profiles.read().await.get(participant).cloned())
    }

    async fn save(&self, profile: &StoredProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(profile.id().clone(), profile.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.profiles.read().await.len())
    }
}
