//! The `Active` phase: read, classify, relay.

use super::transport::LineReader;
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::{CommandLine, Context, LINE_TOO_LONG, Registry, chat_line};
use crate::state::{ConnId, Hub, RegisteredState, SessionPhase};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{Span, debug, warn};

/// Run until a fatal condition. Never returns `Ok`.
pub(super) async fn run_active<R>(
    conn: ConnId,
    hub: &Arc<Hub>,
    registry: &Registry,
    reader: &mut LineReader<R>,
    state: &mut RegisteredState,
) -> HandlerResult
where
    R: AsyncRead + Unpin,
{
    debug!(phase = %SessionPhase::Active, "Entering read loop");

    loop {
        let raw = match reader.next_line().await {
            Ok(line) => line,
            Err(HandlerError::LineTooLong) => {
                warn!(limit = hub.settings.max_line_length, "Inbound line too long");
                if let Err(e) = hub.delivery.send_direct(conn, LINE_TOO_LONG).await {
                    debug!(error = %e, "Failed to queue line-too-long notice");
                }
                continue;
            }
            Err(e) => return Err(e),
        };

        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        // The registry is authoritative; `/nick` rewrites it.
        let nick = hub.sessions.lookup_nickname(conn);

        if let Some(command) = CommandLine::parse(line) {
            let ctx = Context::new(conn, &nick, hub);
            match registry.dispatch(&ctx, command).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(error = %e, "Command failed"),
            }
            let current = hub.sessions.lookup_nickname(conn);
            if current != nick {
                Span::current().record("nick", current.as_str());
            }
            continue;
        }

        relay_chat_line(conn, hub, &nick, line).await;
        state.lines_relayed += 1;
    }
}

/// Broadcast a chat line to everyone else, then log it to history.
async fn relay_chat_line(conn: ConnId, hub: &Hub, nick: &str, body: &str) {
    let message = chat_line(nick, body);

    let outcome = hub.delivery.broadcast(&message, Some(conn)).await;
    crate::metrics::record_chat_line();
    if outcome.failed > 0 {
        debug!(
            delivered = outcome.delivered,
            failed = outcome.failed,
            "Broadcast partially delivered"
        );
    }

    if let Err(e) = hub.history.append(&message).await {
        crate::metrics::record_history_failure("append");
        warn!(error = %e, "Failed to append chat line to history");
    }
}
