//! Command handler registry and dispatch.

use super::context::{CommandHandler, Context};
use crate::error::{HandlerError, HandlerResult};
use crate::handlers::helpers::UNKNOWN_COMMAND;
use crate::handlers::{ExitHandler, NickHandler};
use crate::telemetry::CommandTimer;
use std::collections::HashMap;
use tracing::{Instrument, Level, debug, span};

/// First character of every command line.
pub const COMMAND_MARKER: char = '/';

/// A command line split into its name and argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// Name without the marker, as typed (`"nick"` for `/nick`).
    pub name: &'a str,
    pub arg: Option<&'a str>,
}

impl<'a> CommandLine<'a> {
    /// Split `line`, returning `None` if it is not a command.
    pub fn parse(line: &'a str) -> Option<Self> {
        let rest = line.strip_prefix(COMMAND_MARKER)?;
        let (name, arg) = match rest.split_once(' ') {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest.trim_end(), None),
        };
        Some(Self { name, arg })
    }
}

/// Registry of command handlers.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn CommandHandler>> = HashMap::new();
        handlers.insert("nick", Box::new(NickHandler));
        handlers.insert("exit", Box::new(ExitHandler));
        Self { handlers }
    }

    /// Dispatch one command line.
    ///
    /// Unknown commands get an "Unknown command" reply and come back as
    /// `HandlerError::UnknownCommand`, which is not fatal to the session.
    pub async fn dispatch(&self, ctx: &Context<'_>, command: CommandLine<'_>) -> HandlerResult {
        let Some(handler) = self.handlers.get(command.name) else {
            crate::metrics::record_command_error("unknown", "unknown_command");
            ctx.reply(UNKNOWN_COMMAND).await?;
            return Err(HandlerError::UnknownCommand(format!(
                "{COMMAND_MARKER}{}",
                command.name
            )));
        };

        let cmd_span = span!(
            Level::DEBUG,
            "chat.command",
            command = %command.name,
            conn = %ctx.conn,
            nick = %ctx.nick,
        );

        let _timer = CommandTimer::new(command.name);
        let result = handler.handle(ctx, command.arg).instrument(cmd_span).await;

        if let Err(ref e) = result {
            crate::metrics::record_command_error(command.name, e.error_code());
            debug!(command = %command.name, error = %e, "Command ended with error");
        }

        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Hub;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::time::timeout;

    #[test]
    fn parse_splits_name_and_argument() {
        assert_eq!(
            CommandLine::parse("/nick bob"),
            Some(CommandLine { name: "nick", arg: Some("bob") })
        );
        assert_eq!(
            CommandLine::parse("/nick   mary ann  "),
            Some(CommandLine { name: "nick", arg: Some("mary ann") })
        );
        assert_eq!(
            CommandLine::parse("/nick "),
            Some(CommandLine { name: "nick", arg: None })
        );
        assert_eq!(
            CommandLine::parse("/exit"),
            Some(CommandLine { name: "exit", arg: None })
        );
        assert_eq!(CommandLine::parse("hello /nick"), None);
    }

    #[test]
    fn names_are_case_sensitive() {
        let registry = Registry::new();
        assert!(registry.handlers.contains_key("nick"));
        assert!(!registry.handlers.contains_key("NICK"));
    }

    #[tokio::test]
    async fn unknown_command_replies_and_is_not_fatal() {
        let hub = Hub::for_tests();
        let conn = hub.conn_ids.next();
        let (ours, theirs) = tokio::io::duplex(1024);
        let _handle = hub.delivery.add_subscriber(conn, ours);
        let mut lines = BufReader::new(theirs).lines();

        let registry = Registry::new();
        let ctx = Context::new(conn, "alice", &hub);
        let command = CommandLine::parse("/foo bar").unwrap();
        let err = registry.dispatch(&ctx, command).await.unwrap_err();

        assert!(matches!(&err, HandlerError::UnknownCommand(name) if name == "/foo"));
        assert!(!err.is_fatal());
        let reply = timeout(Duration::from_secs(2), lines.next_line())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply.as_deref(), Some("Unknown command"));
    }

    #[tokio::test]
    async fn exit_dispatches_to_client_exit() {
        let hub = Hub::for_tests();
        let registry = Registry::new();
        let ctx = Context::new(hub.conn_ids.next(), "alice", &hub);

        let result = registry
            .dispatch(&ctx, CommandLine::parse("/exit").unwrap())
            .await;
        assert!(matches!(result, Err(HandlerError::ClientExit)));
    }
}
