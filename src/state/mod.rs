//! State management module.
//!
//! Contains the Hub (shared relay state) and the managers it is built from.

mod hub;
pub mod managers;
mod session;
mod uid;

pub use hub::{Hub, SessionSettings};
pub use session::{RegisteredState, SessionPhase};
pub use uid::{ConnId, ConnIdGenerator};
