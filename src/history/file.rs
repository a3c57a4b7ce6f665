//! Append-only chat log on the local filesystem.

use super::{HistoryError, HistoryProvider};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// One line per message, newline-terminated, in append order.
pub struct FileHistory {
    path: PathBuf,
    file: RwLock<File>,
}

impl FileHistory {
    /// Open (creating if needed) the log at `path` for appending.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryProvider for FileHistory {
    async fn append(&self, line: &str) -> Result<(), HistoryError> {
        if line.trim().is_empty() {
            return Err(HistoryError::EmptyMessage);
        }

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let mut file = self.file.write().await;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn last_n(&self, count: usize) -> Result<Vec<String>, HistoryError> {
        // Readers exclude the writer so a half-written record is never returned.
        let _guard = self.file.read().await;
        let data = tokio::fs::read_to_string(&self.path).await?;
        Ok(tail_lines(&data, count))
    }
}

fn tail_lines(data: &str, count: usize) -> Vec<String> {
    let lines: Vec<&str> = data.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].iter().map(|l| l.to_string()).collect()
}
