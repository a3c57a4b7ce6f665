//! History provider abstraction.
//!
//! The chat history is a flat, append-only log of pre-formatted lines. Sessions
//! append every relayed chat line and replay the tail to newcomers. Failures
//! are reported to the caller, which logs them; history never ends a session.

use async_trait::async_trait;
use thiserror::Error;

pub mod file;
pub mod noop;

pub use file::FileHistory;
pub use noop::NoOpProvider;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot save empty message")]
    EmptyMessage,
}

#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Append one line to the log.
    async fn append(&self, line: &str) -> Result<(), HistoryError>;

    /// The last `count` non-blank lines, oldest first.
    async fn last_n(&self, count: usize) -> Result<Vec<String>, HistoryError>;
}
