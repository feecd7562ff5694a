//! finquest - leveling and realtime synchronization core for a gamified
//! personal-finance client
//!
//! - `leveling`: pure XP → level functions and apply-delta
//! - `progression`: persisting gains for the signed-in user
//! - `realtime`: change-feed registrations bound to the current identity
//! - `finance`: expense and savings records and their statistics

pub mod auth;
pub mod cli;
pub mod finance;
pub mod leveling;
pub mod notify;
pub mod observability;
pub mod profile;
pub mod progression;
pub mod realtime;
