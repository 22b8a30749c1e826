//! High-level runtime orchestrator.
//!
//! The runtime owns the encounter worker, wires up command/event channels,
//! and exposes a builder-based API for hosts to drive encounters.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use expedition_content::ContentPack;
use expedition_core::Encounter;

use crate::api::{EncounterHandle, Result, RuntimeError};
use crate::events::EventBus;
use crate::repository::{InMemoryProfileStore, ProfileStore};
use crate::workers::EncounterWorker;

/// Runtime configuration shared across the orchestrator and worker.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// How often the worker advances the encounter clock.
    pub tick_interval: Duration,
    /// How long a participant who died stays out of new encounters.
    pub death_lockout: Duration,
    /// Fixed encounter seed; random when unset.
    pub seed: Option<u64>,
    /// Where hosts keep persistent data such as the profile store.
    pub data_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 100,
            tick_interval: Duration::from_millis(100),
            death_lockout: Duration::from_secs(30 * 60),
            seed: None,
            data_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Reads `EXPEDITION_*` variables, keeping the default for anything
    /// unset or unparsable. Buffer sizes and the tick must be non-zero.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `EXPEDITION_COMMAND_BUFFER` | `command_buffer_size` |
    /// | `EXPEDITION_EVENT_BUFFER` | `event_buffer_size` |
    /// | `EXPEDITION_TICK_MS` | `tick_interval` |
    /// | `EXPEDITION_DEATH_LOCKOUT_MINUTES` | `death_lockout` |
    /// | `EXPEDITION_SEED` | `seed` |
    /// | `EXPEDITION_DATA_DIR` | `data_dir` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            command_buffer_size: read_env("EXPEDITION_COMMAND_BUFFER")
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.command_buffer_size),
            event_buffer_size: read_env("EXPEDITION_EVENT_BUFFER")
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.event_buffer_size),
            tick_interval: read_env("EXPEDITION_TICK_MS")
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            death_lockout: read_env("EXPEDITION_DEATH_LOCKOUT_MINUTES")
                .map(|minutes: u64| Duration::from_secs(minutes * 60))
                .unwrap_or(defaults.death_lockout),
            seed: read_env("EXPEDITION_SEED").or(defaults.seed),
            data_dir: read_env("EXPEDITION_DATA_DIR").or(defaults.data_dir),
        }
    }
}

fn read_env<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(target: "runtime::config", key, value = %raw, "ignoring unparsable value");
            None
        }
    }
}

/// Main runtime that hosts one encounter at a time
///
/// Design: Runtime owns the worker task. [`EncounterHandle`] provides a
/// cloneable façade for command sources.
pub struct Runtime {
    handle: EncounterHandle,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> EncounterHandle {
        self.handle.clone()
    }

    /// Stop the worker and wait for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        match self.handle.shutdown().await {
            // Already stopped through another handle.
            Ok(()) | Err(RuntimeError::CommandChannelClosed) => {}
            Err(e) => return Err(e),
        }
        drop(self.handle);

        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    content: Option<ContentPack>,
    store: Option<Arc<dyn ProfileStore>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            content: None,
            store: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required content pack (abilities, bestiary, combat config)
    pub fn content(mut self, content: ContentPack) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the profile store. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the runtime and spawn its worker. Must be called from within a
    /// tokio runtime.
    pub fn build(self) -> Result<Runtime> {
        let content = self.content.ok_or(RuntimeError::MissingContent)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryProfileStore::new()));
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let encounter = Encounter::new(content.config.clone(), seed)?;

        // Zero-capacity channels panic in tokio.
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let death_lockout = chrono::Duration::from_std(self.config.death_lockout)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));

        let worker = EncounterWorker::new(
            encounter,
            Arc::new(content),
            store,
            command_rx,
            event_bus.clone(),
            self.config.tick_interval,
            death_lockout,
        );
        let worker_handle = tokio::spawn(worker.run());

        tracing::info!(
            target: "runtime::worker",
            seed,
            tick_ms = self.config.tick_interval.as_millis() as u64,
            "runtime started"
        );

        Ok(Runtime {
            handle: EncounterHandle::new(command_tx, event_bus),
            worker_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RuntimeConfig::default();
        assert_eq!(config.command_buffer_size, 32);
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.death_lockout, Duration::from_secs(1800));
    }

    #[test]
    fn read_env_ignores_garbage() {
        // Unique key so parallel tests never collide.
        let key = "EXPEDITION_TEST_READ_ENV_GARBAGE";
        unsafe { std::env::set_var(key, "not-a-number") };
        assert_eq!(read_env::<u64>(key), None);
        unsafe { std::env::set_var(key, " 42 ") };
        assert_eq!(read_env::<u64>(key), Some(42));
        unsafe { std::env::remove_var(key) };
    }

    #[test]
    fn zero_buffer_sizes_fall_back_to_defaults() {
        unsafe {
            std::env::set_var("EXPEDITION_COMMAND_BUFFER", "0");
            std::env::set_var("EXPEDITION_EVENT_BUFFER", "0");
        }
        let config = RuntimeConfig::from_env();
        unsafe {
            std::env::remove_var("EXPEDITION_COMMAND_BUFFER");
            std::env::remove_var("EXPEDITION_EVENT_BUFFER");
        }

        assert_eq!(config.command_buffer_size, 32);
        assert_eq!(config.event_buffer_size, 100);
    }

    #[tokio::test]
    async fn zero_buffers_in_code_still_build() {
        let content = expedition_content::ContentFactory::embedded().unwrap();
        let runtime = Runtime::builder()
            .config(RuntimeConfig {
                command_buffer_size: 0,
                event_buffer_size: 0,
                seed: Some(1),
                ..RuntimeConfig::default()
            })
            .content(content)
            .build()
            .unwrap();

        let snapshot = runtime.handle().snapshot().await.unwrap();
        assert_eq!(snapshot.phase, expedition_core::EncounterPhase::Idle);
        runtime.shutdown().await.unwrap();
    }
}
