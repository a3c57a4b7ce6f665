//! Network module.
//!
//! Contains the Gateway (TCP listener) and the per-connection session handler.

mod connection;
mod gateway;

pub use connection::Connection;
pub use gateway::Gateway;
