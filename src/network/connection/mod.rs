//! Connection - handles one client session from accept to cleanup.
//!
//! ```text
//!  accept ──▶ Connecting ──▶ Registering ──▶ Active ──▶ Closing ──▶ Closed
//!             subscribe      prompt,          read loop   unregister,
//!             writer         nickname,        commands,   close queue,
//!                            join notice,     chat relay  shut stream,
//!                            replay                       leave notice
//! ```
//!
//! The write half is handed to the delivery engine on accept, so every
//! outbound line (prompt included) goes through the subscriber queue. The
//! read half stays with this task. Every ending, including a failed
//! registration, goes through `lifecycle::close_session`.

mod error_handling;
mod event_loop;
mod handshake;
mod lifecycle;
mod transport;

use crate::error::HandlerResult;
use crate::handlers::Registry;
use crate::state::{ConnId, Hub, RegisteredState, SessionPhase};
use error_handling::is_clean_close;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf};
use tracing::{debug, info, warn};
use transport::LineReader;

/// A client connection handler.
pub struct Connection<S> {
    conn: ConnId,
    addr: SocketAddr,
    stream: S,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    pub fn new(
        conn: ConnId,
        stream: S,
        addr: SocketAddr,
        hub: Arc<Hub>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            conn,
            addr,
            stream,
            hub,
            registry,
        }
    }

    /// Run the session to completion.
    ///
    /// Returns what ended it. Cleanup has already run by the time this returns.
    pub async fn run(self) -> HandlerResult {
        let Self {
            conn,
            addr,
            stream,
            hub,
            registry,
        } = self;

        debug!(phase = %SessionPhase::Connecting, %addr, "Subscribing connection");
        let (read_half, write_half) = tokio::io::split(stream);
        let delivery = hub.delivery.add_subscriber(conn, write_half);
        crate::metrics::session_connected();

        let mut reader = LineReader::new(read_half, &hub.settings, hub.lifecycle.watcher());
        let mut registered = None;

        let result = drive(conn, &hub, &registry, &mut reader, &mut registered).await;

        lifecycle::close_session(conn, &hub, delivery, registered.as_ref(), &result).await;
        crate::metrics::session_disconnected();

        if is_clean_close(&result) {
            info!(%addr, "Connection closed");
        } else if let Err(e) = &result {
            warn!(%addr, error = %e, "Connection ended with error");
        }
        result
    }
}

async fn drive<S>(
    conn: ConnId,
    hub: &Arc<Hub>,
    registry: &Registry,
    reader: &mut LineReader<ReadHalf<S>>,
    registered: &mut Option<RegisteredState>,
) -> HandlerResult
where
    S: AsyncRead,
{
    let state = registered.insert(handshake::register(conn, hub, reader).await?);
    event_loop::run_active(conn, hub, registry, reader, state).await
}
