//! Expedition host binary.
//!
//! Composition root that assembles content, the profile store and the
//! runtime, then drives the encounter from a JSON-lines protocol: commands
//! arrive on stdin, replies and events leave on stdout, logs go to stderr.
//!
//! # Environment
//!
//! - `EXPEDITION_CONTENT_DIR`: load content from this directory instead of
//!   the embedded pack
//! - `EXPEDITION_DATA_DIR`: where `profiles.json` lives (defaults to the
//!   platform data directory)
//! - `EXPEDITION_LOG_DIR`: also write logs to a daily file here
//! - `RUST_LOG`: log filter, `info` by default
//!
//! See `RuntimeConfig::from_env` for the remaining `EXPEDITION_*` keys.

mod commands;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use commands::HostCommand;
use expedition_content::{ContentFactory, ContentPack};
use expedition_runtime::{
    EncounterHandle, FileProfileStore, ProfileStore, Runtime, RuntimeConfig, SequencedEvent,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    dotenvy::dotenv().ok();

    let _log_guard = logging::setup_logging()?;

    let config = RuntimeConfig::from_env();
    let content = load_content()?;
    let store = open_store(&config).await?;

    tracing::info!(
        target: "host::main",
        abilities = content.abilities.len(),
        enemies = content.bestiary.enemies().len(),
        profiles = store.count().await?,
        "starting expedition host"
    );

    let runtime = Runtime::builder()
        .config(config)
        .content(content)
        .store(store)
        .build()?;
    let handle = runtime.handle();

    let printer = tokio::spawn(print_events(handle.subscribe_all()));

    tokio::select! {
        result = drive(&handle) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!(target: "host::main", "interrupted"),
    }

    runtime.shutdown().await?;
    drop(handle);
    // The bus closes once the last handle is gone.
    let _ = printer.await;

    tracing::info!(target: "host::main", "expedition host stopped");
    Ok(())
}

fn load_content() -> Result<ContentPack> {
    match std::env::var_os("EXPEDITION_CONTENT_DIR") {
        Some(dir) => {
            let factory = ContentFactory::new(dir);
            tracing::info!(
                target: "host::content",
                dir = %factory.data_dir().display(),
                "loading content"
            );
            factory.load_all()
        }
        None => ContentFactory::embedded(),
    }
}

async fn open_store(config: &RuntimeConfig) -> Result<Arc<dyn ProfileStore>> {
    let data_dir = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => default_data_dir()?,
    };
    let path = data_dir.join("profiles.json");
    let store = FileProfileStore::open(&path)
        .await
        .with_context(|| format!("failed to open profile store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "expedition")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .context("could not determine a data directory; set EXPEDITION_DATA_DIR")
}

/// Reads commands until stdin closes. Malformed or failed commands are
/// reported on stdout and skipped.
async fn drive(handle: &EncounterHandle) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match HostCommand::parse(line) {
            Ok(command) => command.dispatch(handle).await,
            Err(e) => Err(e),
        };
        let reply = reply.unwrap_or_else(|e| {
            tracing::debug!(target: "host::driver", error = %e, "command failed");
            serde_json::json!({ "type": "error", "message": format!("{e:#}") })
        });
        println!("{reply}");
    }

    tracing::info!(target: "host::driver", "stdin closed");
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<SequencedEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(
                    target: "host::events",
                    error = %e,
                    seq = event.seq,
                    "failed to encode event"
                ),
            },
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(target: "host::events", missed, "event printer fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
