//! Handler context and trait.

use crate::error::HandlerResult;
use crate::state::{ConnId, Hub};
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a command handler may touch while it runs.
pub struct Context<'a> {
    /// Connection that issued the command.
    pub conn: ConnId,
    /// Caller's nickname as of dispatch.
    pub nick: &'a str,
    pub hub: &'a Arc<Hub>,
}

impl<'a> Context<'a> {
    pub fn new(conn: ConnId, nick: &'a str, hub: &'a Arc<Hub>) -> Self {
        Self { conn, nick, hub }
    }

    /// Queue a line for the calling connection only.
    pub async fn reply(&self, text: &str) -> HandlerResult {
        self.hub.delivery.send_direct(self.conn, text).await?;
        Ok(())
    }
}

/// A slash command.
///
/// `arg` is everything after the first space following the command name,
/// trimmed; `None` when nothing is left.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>, arg: Option<&str>) -> HandlerResult;
}
