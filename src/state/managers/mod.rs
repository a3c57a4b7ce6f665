//! Domain managers for server state.
//!
//! Each manager owns one piece of shared state and its lock:
//! - [`session`]: connection → nickname registry
//! - [`delivery`]: connection → outbound queue, plus the delivery tasks
//! - [`lifecycle`]: process shutdown signal

pub mod delivery;
pub mod lifecycle;
pub mod session;
