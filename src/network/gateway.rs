//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds a socket and spawns a `Connection` task per client.
//! It stops accepting as soon as shutdown begins; the spawned sessions are
//! tracked so `main` can wait for their cleanup.

use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::Hub;
use crate::telemetry::spans;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, instrument};

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    hub: Arc<Hub>,
    registry: Arc<Registry>,
    sessions: TaskTracker,
}

impl Gateway {
    /// Bind the gateway to the specified address.
    pub async fn bind(addr: SocketAddr, hub: Arc<Hub>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(address = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            listener,
            hub,
            registry: Arc::new(Registry::new()),
            sessions: TaskTracker::new(),
        })
    }

    /// Tracker for every session task this gateway spawns.
    pub fn sessions(&self) -> TaskTracker {
        self.sessions.clone()
    }

    /// Accept connections until shutdown begins.
    ///
    /// The listener is dropped on return, so no new client can connect.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        let mut shutdown = self.hub.lifecycle.watcher();

        loop {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.signaled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(%addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let conn = self.hub.conn_ids.next();
                    info!(%conn, %addr, "Connection accepted");

                    let span = spans::connection(&conn.to_string(), &addr.to_string());
                    let connection = Connection::new(
                        conn,
                        stream,
                        addr,
                        Arc::clone(&self.hub),
                        Arc::clone(&self.registry),
                    );
                    self.sessions.spawn(
                        async move {
                            // Outcome is logged by the session itself.
                            let _ = connection.run().await;
                        }
                        .instrument(span),
                    );
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }

        self.sessions.close();
        info!(active = self.sessions.len(), "Listener closed");
        Ok(())
    }
}
