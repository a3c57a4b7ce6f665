//! Unified error handling for chatrelay.
//!
//! Errors are tagged enums so callers can match on the kind (for example,
//! "did the client ask to leave?") instead of inspecting strings.

use thiserror::Error;

// ============================================================================
// Handler Errors (session and command processing)
// ============================================================================

/// Errors that end or interrupt a step of a client session.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("empty nickname")]
    EmptyNickname,

    /// The client sent `/exit`.
    #[error("client requested exit")]
    ClientExit,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("input line too long")]
    LineTooLong,

    #[error("read timed out")]
    ReadTimeout,

    #[error("server shutting down")]
    Shutdown,

    #[error("stream closed before a line was read")]
    EndOfStream,

    #[error("delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyNickname => "empty_nickname",
            Self::ClientExit => "client_exit",
            Self::UnknownCommand(_) => "unknown_command",
            Self::LineTooLong => "line_too_long",
            Self::ReadTimeout => "read_timeout",
            Self::Shutdown => "shutdown",
            Self::EndOfStream => "end_of_stream",
            Self::Delivery(_) => "delivery_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Whether this error must end the session.
    ///
    /// Unknown commands, over-long lines and failed replies are logged and the
    /// session carries on; everything else funnels into cleanup.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::UnknownCommand(_) | Self::LineTooLong | Self::Delivery(_)
        )
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Delivery Errors (outbound queues)
// ============================================================================

/// Failure to hand a message to one subscriber's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("connection has no active outbound queue")]
    NotSubscribed,

    #[error("outbound queue is full")]
    QueueFull,

    #[error("failed to enqueue after {retries} retries")]
    RetriesExhausted { retries: u32 },

    #[error("outbound queue is closed")]
    Closed,
}

impl DeliveryError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotSubscribed => "not_subscribed",
            Self::QueueFull => "queue_full",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_error_codes() {
        assert_eq!(HandlerError::ClientExit.error_code(), "client_exit");
        assert_eq!(HandlerError::EmptyNickname.error_code(), "empty_nickname");
        assert_eq!(
            HandlerError::UnknownCommand("/foo".into()).error_code(),
            "unknown_command"
        );
        assert_eq!(
            HandlerError::from(DeliveryError::QueueFull).error_code(),
            "delivery_error"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(HandlerError::ClientExit.is_fatal());
        assert!(HandlerError::EndOfStream.is_fatal());
        assert!(!HandlerError::UnknownCommand("/x".into()).is_fatal());
        assert!(!HandlerError::LineTooLong.is_fatal());
        assert!(!HandlerError::Delivery(DeliveryError::QueueFull).is_fatal());
    }

    #[test]
    fn test_exit_is_matchable_through_wrapping() {
        let err: Result<(), HandlerError> = Err(HandlerError::ClientExit);
        assert!(matches!(err, Err(HandlerError::ClientExit)));
    }

    #[test]
    fn test_delivery_error_display() {
        let e = DeliveryError::RetriesExhausted { retries: 3 };
        assert_eq!(e.to_string(), "failed to enqueue after 3 retries");
        assert_eq!(e.error_code(), "retries_exhausted");
    }
}
