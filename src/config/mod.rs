//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ServerConfig, TimeoutsConfig)
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`history`]: Chat history log configuration (HistoryConfig)
//! - [`delivery`]: Outbound queue and backpressure configuration (DeliveryConfig)
//! - [`validation`]: Startup validation of a loaded config

mod delivery;
mod history;
mod listen;
mod types;
pub mod validation;

pub use delivery::{DeliveryConfig, DeliveryPolicy};
pub use history::HistoryConfig;
pub use listen::ListenConfig;
pub use types::{Config, ConfigError, ServerConfig, TimeoutsConfig};
