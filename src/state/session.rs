//! Session state machine types.
//!
//! ```text
//! Connecting ──▶ Registering ──▶ Active ──▶ Closing ──▶ Closed
//!                     │                        ▲
//!                     └────── (bad nickname) ──┘
//! ```
//!
//! A session only reaches `Active` holding a `RegisteredState`, which can only
//! be built from a non-empty nickname.

use crate::error::HandlerError;
use std::fmt;
use std::time::Instant;

/// Where a session is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Registering,
    Active,
    Closing,
    Closed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data a session carries once registration succeeded.
///
/// The nickname here is the one chosen at registration; renames go through
/// the session registry, which stays authoritative.
#[derive(Debug)]
pub struct RegisteredState {
    pub nick: String,
    pub registered_at: Instant,
    pub lines_relayed: u64,
}

impl RegisteredState {
    /// Build the registered state from the raw nickname line.
    ///
    /// Surrounding whitespace is trimmed; nothing left means the attempt fails.
    pub fn from_nickname_line(line: &str) -> Result<Self, HandlerError> {
        let nick = line.trim();
        if nick.is_empty() {
            return Err(HandlerError::EmptyNickname);
        }
        Ok(Self {
            nick: nick.to_string(),
            registered_at: Instant::now(),
            lines_relayed: 0,
        })
    }
}
