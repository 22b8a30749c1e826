//! JSON-file profile store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use expedition_core::ParticipantId;

use super::{ProfileStore, RepositoryError, Result, StoredProfile};

/// Keeps every profile in one JSON document.
///
/// The document is loaded once on open and rewritten after each save by
/// writing a temp file and renaming it over the original, so a crash mid-write
/// leaves the previous version intact.
pub struct FileProfileStore {
    path: PathBuf,
    profiles: Mutex<BTreeMap<ParticipantId, StoredProfile>>,
}

impl FileProfileStore {
    /// Open the store at `path`, creating parent directories as needed. A
    /// missing file is treated as an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let profiles = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                RepositoryError::CorruptedData {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(
            target: "runtime::repository",
            path = %path.display(),
            profiles = profiles.len(),
            "profile store opened"
        );

        Ok(Self {
            path,
            profiles: Mutex::new(profiles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, profiles: &BTreeMap<ParticipantId, StoredProfile>) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(profiles)?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load(&self, participant: &ParticipantId) -> Result<Option<StoredProfile>> {
        Ok(self.profiles.lock().await.get(participant).cloned())
    }

    async fn save(&self, profile: &StoredProfile) -> Result<()> {
        let mut profiles = self.profiles.lock().await;
        profiles.insert(profile.id().clone(), profile.clone());
        self.persist(&profiles).await?;
        tracing::trace!(
            target: "runtime::repository",
            participant = %profile.id(),
            "profile saved"
        );
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.profiles.lock().await.len())
    }
}
