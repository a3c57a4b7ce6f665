//! No-op history provider that discards all messages.
//!
//! Used when history is disabled. All operations succeed but store nothing.

use super::{HistoryError, HistoryProvider};
use async_trait::async_trait;

pub struct NoOpProvider;

#[async_trait]
impl HistoryProvider for NoOpProvider {
    async fn append(&self, _line: &str) -> Result<(), HistoryError> {
        Ok(())
    }

    async fn last_n(&self, _count: usize) -> Result<Vec<String>, HistoryError> {
        Ok(vec![])
    }
}
