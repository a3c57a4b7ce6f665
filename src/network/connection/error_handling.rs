//! Error classification for connection reads and session endings.

use crate::error::{HandlerError, HandlerResult};
use tokio_util::codec::LinesCodecError;

/// Map a framing error onto the session error taxonomy.
///
/// An over-long line is recoverable: the codec discards up to the next
/// newline and keeps reading. Anything else means the stream is unusable.
pub(super) fn classify_read_error(e: LinesCodecError) -> HandlerError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => HandlerError::LineTooLong,
        LinesCodecError::Io(e) => HandlerError::Io(e),
    }
}

/// Label for why a session ended, used in logs and metrics.
pub(super) fn close_reason(result: &HandlerResult) -> &'static str {
    match result {
        Ok(()) => "closed",
        Err(e) => e.error_code(),
    }
}

/// Whether a session ending is routine rather than worth a warning.
pub(super) fn is_clean_close(result: &HandlerResult) -> bool {
    matches!(
        result,
        Ok(())
            | Err(HandlerError::ClientExit)
            | Err(HandlerError::EndOfStream)
            | Err(HandlerError::Shutdown)
    )
}
