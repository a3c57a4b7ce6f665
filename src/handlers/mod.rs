//! Chat command handlers.
//!
//! Lines starting with `/` in an active session are commands. This module
//! holds the `CommandHandler` trait, the registry that dispatches to it, and
//! the text builders for every notice the relay emits.

mod commands;
mod core;
mod helpers;

pub use commands::{ExitHandler, NickHandler};
pub use self::core::context::{CommandHandler, Context};
pub use self::core::registry::{COMMAND_MARKER, CommandLine, Registry};
pub use helpers::{
    LINE_TOO_LONG, NICK_USAGE, NICKNAME_PROMPT, UNKNOWN_COMMAND, chat_line, joined, left,
    renamed,
};
