//! # Profiles
//!
//! Persistence of the per-user XP total. The managed backend owns the real
//! table; the stores here implement the same contract in memory and on
//! disk.

mod errors;
mod file;
mod store;

pub use errors::{ProfileError, ProfileResult};
pub use file::FileProfileStore;
pub use store::{MemoryProfileStore, Profile, ProfileStore};
