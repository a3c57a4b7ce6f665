//! The `Closing` phase: release everything the session acquired.

use super::error_handling::close_reason;
use crate::error::HandlerResult;
use crate::handlers::left;
use crate::state::managers::delivery::DeliveryHandle;
use crate::state::{ConnId, Hub, RegisteredState, SessionPhase};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Unconditional cleanup, run once per session whatever ended it.
///
/// Order: unregister, close the queue, wait for the delivery task and shut
/// the stream down, then tell everyone who is left.
pub(super) async fn close_session(
    conn: ConnId,
    hub: &Hub,
    delivery: DeliveryHandle,
    registered: Option<&RegisteredState>,
    result: &HandlerResult,
) {
    let reason = close_reason(result);
    debug!(phase = %SessionPhase::Closing, reason, "Cleaning up session");

    // Empty when registration never completed.
    let nick = hub.sessions.lookup_nickname(conn);
    hub.sessions.unregister(conn);
    if registered.is_some() {
        crate::metrics::session_unregistered();
    }

    hub.delivery.remove_subscriber(conn);
    if let Some(mut writer) = delivery.join().await
        && let Err(e) = writer.shutdown().await
    {
        debug!(error = %e, "Stream shutdown failed");
    }

    if !nick.is_empty() {
        hub.delivery.broadcast(&left(&nick), None).await;
    }

    crate::metrics::record_session_closed(reason);
    info!(
        nick = %nick,
        reason,
        lines_relayed = registered.map_or(0, |s| s.lines_relayed),
        connected_for = ?registered.map(|s| s.registered_at.elapsed()),
        "Session closed"
    );
    debug!(phase = %SessionPhase::Closed, "Session finished");
}
