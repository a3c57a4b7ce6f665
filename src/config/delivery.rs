//! Outbound delivery configuration.

use serde::Deserialize;
use std::time::Duration;

/// What happens when a subscriber's outbound queue is full.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryPolicy {
    /// Retry the enqueue a fixed number of times, each bounded by a timeout.
    #[default]
    BoundedRetry,
    /// Drop the message for that subscriber immediately.
    DropOnFull,
}

/// Per-subscriber queue sizing and backpressure policy.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Slots in each subscriber's outbound queue (default: 15).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Backpressure policy (default: bounded-retry).
    #[serde(default)]
    pub policy: DeliveryPolicy,
    /// Enqueue attempts before giving up on a subscriber (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-attempt enqueue timeout in milliseconds (default: 5000).
    #[serde(default = "default_retry_timeout_ms")]
    pub retry_timeout_ms: u64,
}

impl DeliveryConfig {
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            policy: DeliveryPolicy::default(),
            max_retries: default_max_retries(),
            retry_timeout_ms: default_retry_timeout_ms(),
        }
    }
}

fn default_queue_capacity() -> usize {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_timeout_ms() -> u64 {
    5000
}
