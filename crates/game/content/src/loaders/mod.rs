//! Content loaders for reading game data from files.
//!
//! Each loader parses one file format into the plain data types
//! `expedition-core` consumes, and checks the cross-references the engine
//! would otherwise only discover mid-encounter.

pub mod abilities;
pub mod bestiary;
pub mod config;
pub mod factory;

pub use abilities::AbilityLoader;
pub use bestiary::BestiaryLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;

use std::path::Path;

use anyhow::Context;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
