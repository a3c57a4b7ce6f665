//! Registration: prompt, nickname, join notice, history replay, activation.

use super::transport::LineReader;
use crate::error::HandlerError;
use crate::handlers::{NICKNAME_PROMPT, joined};
use crate::state::{ConnId, Hub, RegisteredState, SessionPhase};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tracing::{Span, debug, info, warn};

/// Take the session from `Registering` to `Active`.
///
/// Exactly one line is read as the nickname; a blank one ends the attempt.
pub(super) async fn register<R>(
    conn: ConnId,
    hub: &Arc<Hub>,
    reader: &mut LineReader<R>,
) -> Result<RegisteredState, HandlerError>
where
    R: AsyncRead + Unpin,
{
    debug!(phase = %SessionPhase::Registering, "Prompting for nickname");
    if let Err(e) = hub.delivery.send_direct(conn, NICKNAME_PROMPT).await {
        warn!(error = %e, "Failed to queue nickname prompt");
    }

    let line = reader.next_line().await?;
    let state = RegisteredState::from_nickname_line(&line)?;

    hub.sessions.register(conn, state.nick.as_str());
    crate::metrics::session_registered();
    Span::current().record("nick", state.nick.as_str());
    info!(nick = %state.nick, "Client registered");

    hub.delivery.broadcast(&joined(&state.nick), Some(conn)).await;
    replay_history(conn, hub).await;
    // Broadcasts reach the session only once its replay is queued.
    hub.delivery.activate(conn);

    Ok(state)
}

/// Send the newest history lines to `conn` alone, oldest first.
async fn replay_history(conn: ConnId, hub: &Hub) {
    let count = hub.settings.replay_count;
    if count == 0 {
        return;
    }

    let lines = match hub.history.last_n(count).await {
        Ok(lines) => lines,
        Err(e) => {
            crate::metrics::record_history_failure("read");
            warn!(error = %e, "Failed to read history for replay");
            return;
        }
    };

    for line in &lines {
        if let Err(e) = hub.delivery.send_direct(conn, line).await {
            warn!(error = %e, "History replay interrupted");
            return;
        }
    }
    debug!(lines = lines.len(), "Replayed history");
}
