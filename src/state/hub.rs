//! The Hub - central shared state for the relay.
//!
//! One `Hub` is built at startup and shared (as `Arc<Hub>`) by the gateway
//! and every session task. It owns the session registry, the delivery
//! engine, the history collaborator and the shutdown signal.

use crate::config::Config;
use crate::history::HistoryProvider;
use crate::state::ConnIdGenerator;
use crate::state::managers::delivery::DeliveryManager;
use crate::state::managers::lifecycle::LifecycleManager;
use crate::state::managers::session::SessionRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Per-session knobs taken from the config at startup.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// History lines replayed after registration.
    pub replay_count: usize,
    /// Client silence allowed before the session is dropped.
    pub read_timeout: Option<Duration>,
    /// Longest accepted inbound line, in bytes.
    pub max_line_length: usize,
}

pub struct Hub {
    pub sessions: SessionRegistry,
    pub delivery: DeliveryManager,
    pub history: Arc<dyn HistoryProvider>,
    pub lifecycle: LifecycleManager,
    pub conn_ids: ConnIdGenerator,
    pub settings: SessionSettings,
}

impl Hub {
    pub fn new(config: &Config, history: Arc<dyn HistoryProvider>) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            delivery: DeliveryManager::new(
                config.delivery.clone(),
                config.timeouts.write_timeout(),
            ),
            history,
            lifecycle: LifecycleManager::new(),
            conn_ids: ConnIdGenerator::new(),
            settings: SessionSettings {
                replay_count: if config.history.enabled {
                    config.history.replay_count
                } else {
                    0
                },
                read_timeout: config.timeouts.read_timeout(),
                max_line_length: config.listen.max_line_length,
            },
        }
    }

    /// Begin a cooperative shutdown.
    ///
    /// Every session observes the signal and runs its own cleanup; all outbound
    /// queues are closed so delivery tasks drain and stop.
    pub fn shutdown(&self) {
        self.lifecycle.begin_shutdown();
        let active = self.delivery.active_count();
        let closed = self.delivery.close_all();
        info!(
            queues = closed,
            active,
            registered = self.sessions.len(),
            "Closed all outbound queues"
        );
    }
}

#[cfg(test)]
impl Hub {
    /// Hub with default settings and no history.
    pub fn for_tests() -> Arc<Self> {
        let config: Config = toml::from_str("[listen]\naddress = \"127.0.0.1:0\"\n")
            .expect("minimal config parses");
        Arc::new(Self::new(&config, Arc::new(crate::history::NoOpProvider)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_history_replays_nothing() {
        let config: Config = toml::from_str(
            "[listen]\naddress = \"127.0.0.1:0\"\n[history]\nenabled = false\nreplay_count = 25\n",
        )
        .unwrap();
        let hub = Hub::new(&config, Arc::new(crate::history::NoOpProvider));
        assert_eq!(hub.settings.replay_count, 0);
        assert_eq!(hub.settings.max_line_length, 4096);
    }

    #[tokio::test]
    async fn shutdown_sets_signal_and_closes_queues() {
        let hub = Hub::for_tests();
        let (ours, _theirs) = tokio::io::duplex(64);
        let conn = hub.conn_ids.next();
        let handle = hub.delivery.add_subscriber(conn, ours);

        hub.shutdown();

        assert!(hub.lifecycle.is_shutting_down());
        assert_eq!(hub.delivery.subscriber_count(), 0);
        assert!(handle.join().await.is_some());
    }
}
