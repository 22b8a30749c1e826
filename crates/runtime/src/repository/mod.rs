//! Repository layer for participant profiles.
//!
//! Profiles are the only data the runtime persists: they are read when a
//! participant joins and written back when they die or the encounter ends.
//! Static combat content comes from `expedition-content`, not from here.

mod error;
mod file;
mod memory;
mod profile;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileProfileStore;
pub use memory::InMemoryProfileStore;
pub use profile::StoredProfile;
pub use traits::ProfileStore;
