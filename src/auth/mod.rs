//! # Auth
//!
//! Identity passed into the core and the row ownership rules the change
//! feed applies on the backend's behalf.

pub mod identity;
pub mod rls;

pub use identity::{Identity, UserId};
pub use rls::RowPolicy;
