//! Chat history log configuration.

use serde::Deserialize;

use super::types::default_true;

/// History configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Whether chat lines are appended to the log and replayed on join.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to the append-only log file.
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Number of lines replayed to a newly registered client.
    #[serde(default = "default_replay_count")]
    pub replay_count: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_history_path(),
            replay_count: default_replay_count(),
        }
    }
}

fn default_history_path() -> String {
    "messages.log".to_string()
}

fn default_replay_count() -> usize {
    10
}
