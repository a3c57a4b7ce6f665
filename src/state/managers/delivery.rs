//! Fan-out delivery: per-subscriber outbound queues.
//!
//! Every subscriber owns a bounded queue drained by exactly one delivery task,
//! which writes each message plus `\n` to the client stream. Producers never
//! touch the stream; they only enqueue, under the configured backpressure
//! policy, so a slow reader can stall its own queue and nothing else.
//!
//! ```text
//!   broadcast() ──┬──▶ [queue A] ──▶ delivery task A ──▶ stream A
//!                 ├──▶ [queue B] ──▶ delivery task B ──▶ stream B
//!                 └──▶ [queue C] ──▶ delivery task C ──▶ stream C
//! ```

use crate::config::{DeliveryConfig, DeliveryPolicy};
use crate::error::DeliveryError;
use crate::state::ConnId;
use futures_util::future::join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Write half of a client stream, owned by its delivery task.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

type Outbound = mpsc::Sender<Arc<str>>;

/// One row of the subscriber table.
struct Subscriber {
    tx: Outbound,
    /// Set once the session is past registration and replay. Only active
    /// subscribers receive broadcasts; direct sends reach every subscriber.
    active: bool,
}

/// Handle to a running delivery task.
///
/// Joining waits for the queue to be closed and drained, and hands back the
/// writer so the session can close the stream itself.
pub struct DeliveryHandle {
    conn: ConnId,
    task: JoinHandle<Option<BoxedWriter>>,
}

impl DeliveryHandle {
    /// Wait for the delivery task to finish.
    ///
    /// Returns `None` if the task stopped on a write failure; the writer was
    /// already dropped in that case.
    pub async fn join(self) -> Option<BoxedWriter> {
        match self.task.await {
            Ok(writer) => writer,
            Err(e) => {
                warn!(conn = %self.conn, error = %e, "Delivery task did not complete");
                None
            }
        }
    }
}

/// Result of one broadcast across all eligible subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Subscribers whose queue accepted the message.
    pub delivered: usize,
    /// Subscribers for which the message was dropped or abandoned.
    pub failed: usize,
}

/// Owns the subscriber table and enforces the backpressure policy.
pub struct DeliveryManager {
    subscribers: RwLock<HashMap<ConnId, Subscriber>>,
    config: DeliveryConfig,
    write_timeout: Duration,
}

impl DeliveryManager {
    pub fn new(config: DeliveryConfig, write_timeout: Duration) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            config,
            write_timeout,
        }
    }

    /// Allocate a queue for `conn` and start its delivery task.
    ///
    /// The new subscriber is pending: it gets direct sends but no broadcasts
    /// until `activate`. Call once per connection. A second call replaces the
    /// earlier queue, which closes it and lets its task wind down.
    pub fn add_subscriber<W>(&self, conn: ConnId, writer: W) -> DeliveryHandle
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity);

        let previous = self
            .subscribers
            .write()
            .insert(conn, Subscriber { tx, active: false });
        if previous.is_some() {
            warn!(%conn, "Replaced existing outbound queue");
        }

        let task = tokio::spawn(run_delivery(
            conn,
            Box::new(writer),
            rx,
            self.write_timeout,
        ));

        DeliveryHandle { conn, task }
    }

    /// Start including `conn` in broadcasts. Returns whether it is subscribed.
    pub fn activate(&self, conn: ConnId) -> bool {
        match self.subscribers.write().get_mut(&conn) {
            Some(subscriber) => {
                subscriber.active = true;
                true
            }
            None => false,
        }
    }

    /// Close and remove the queue for `conn`. Returns whether one existed.
    pub fn remove_subscriber(&self, conn: ConnId) -> bool {
        self.subscribers.write().remove(&conn).is_some()
    }

    /// Close every queue. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.subscribers.write().drain().collect();
        drained.len()
    }

    #[cfg(test)]
    pub fn is_subscribed(&self, conn: ConnId) -> bool {
        self.subscribers.read().contains_key(&conn)
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Subscribers currently receiving broadcasts.
    pub fn active_count(&self) -> usize {
        self.subscribers.read().values().filter(|s| s.active).count()
    }

    /// Deliver `message` to every active subscriber except `except`.
    ///
    /// Pass `None` to reach everyone active. Sends are evaluated concurrently, so a
    /// stalled subscriber costs at most one retry budget and never delays the
    /// others.
    pub async fn broadcast(&self, message: &str, except: Option<ConnId>) -> BroadcastOutcome {
        let message: Arc<str> = Arc::from(message);

        // Snapshot the queues; the lock is not held while enqueueing.
        let targets: Vec<(ConnId, Outbound)> = self
            .subscribers
            .read()
            .iter()
            .filter(|(conn, sub)| sub.active && Some(**conn) != except)
            .map(|(conn, sub)| (*conn, sub.tx.clone()))
            .collect();

        let results = join_all(
            targets
                .iter()
                .map(|(conn, tx)| self.attempt_send(*conn, tx, Arc::clone(&message))),
        )
        .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        let outcome = BroadcastOutcome {
            delivered: results.len() - failed,
            failed,
        };
        crate::metrics::record_fanout(outcome.delivered);
        outcome
    }

    /// Deliver `message` to `conn` only.
    pub async fn send_direct(&self, conn: ConnId, message: &str) -> Result<(), DeliveryError> {
        let tx = self
            .subscribers
            .read()
            .get(&conn)
            .map(|sub| sub.tx.clone())
            .ok_or(DeliveryError::NotSubscribed)?;

        self.attempt_send(conn, &tx, Arc::from(message)).await
    }

    async fn attempt_send(
        &self,
        conn: ConnId,
        tx: &Outbound,
        message: Arc<str>,
    ) -> Result<(), DeliveryError> {
        let result = match self.config.policy {
            DeliveryPolicy::DropOnFull => match tx.try_send(message) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    warn!(%conn, "Client is not ready to receive messages, dropping");
                    Err(DeliveryError::QueueFull)
                }
                Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
            },
            DeliveryPolicy::BoundedRetry => self.send_with_retry(conn, tx, message).await,
        };

        match &result {
            Err(DeliveryError::Closed) => {
                debug!(%conn, "Outbound queue already closed");
                crate::metrics::record_delivery_failure(DeliveryError::Closed.error_code());
            }
            Err(e) => crate::metrics::record_delivery_failure(e.error_code()),
            Ok(()) => {}
        }
        result
    }

    async fn send_with_retry(
        &self,
        conn: ConnId,
        tx: &Outbound,
        mut message: Arc<str>,
    ) -> Result<(), DeliveryError> {
        let retries = self.config.max_retries;
        let per_attempt = self.config.retry_timeout();

        for attempt in 1..=retries {
            match tx.send_timeout(message, per_attempt).await {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(returned)) => {
                    warn!(%conn, retry = attempt, "Timed out enqueueing message, retrying");
                    message = returned;
                }
                Err(SendTimeoutError::Closed(_)) => return Err(DeliveryError::Closed),
            }
        }

        warn!(%conn, retries, "Abandoning delivery to unresponsive client");
        Err(DeliveryError::RetriesExhausted { retries })
    }
}

/// Drain `rx` to `writer` until the queue closes or a write fails.
async fn run_delivery(
    conn: ConnId,
    mut writer: BoxedWriter,
    mut rx: mpsc::Receiver<Arc<str>>,
    write_timeout: Duration,
) -> Option<BoxedWriter> {
    while let Some(message) = rx.recv().await {
        match tokio::time::timeout(write_timeout, write_line(&mut writer, &message)).await {
            Ok(Ok(())) => crate::metrics::record_message_sent(),
            Ok(Err(e)) => {
                warn!(%conn, error = %e, "Failed to send message to client");
                return None;
            }
            Err(_) => {
                warn!(%conn, timeout = ?write_timeout, "Write to client timed out");
                return None;
            }
        }
    }

    debug!(%conn, "Outbound queue closed");
    Some(writer)
}

async fn write_line(writer: &mut BoxedWriter, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
